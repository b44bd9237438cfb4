use std::fmt;

/// Lifecycle of one extraction job.
///
/// Forward-only: `PENDING → STARTED → {SUCCESS | FAIL}`. Terminal states
/// carry no further transitions; `Failed` carries a free-text diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Started,
    Success,
    Failed(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed(_))
    }

    pub fn parse(text: &str) -> Option<JobStatus> {
        match text {
            "PENDING" => Some(JobStatus::Pending),
            "STARTED" => Some(JobStatus::Started),
            "SUCCESS" => Some(JobStatus::Success),
            other => other
                .strip_prefix("FAIL:")
                .map(|reason| JobStatus::Failed(reason.trim_start().to_string())),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => f.write_str("PENDING"),
            JobStatus::Started => f.write_str("STARTED"),
            JobStatus::Success => f.write_str("SUCCESS"),
            JobStatus::Failed(reason) => write!(f, "FAIL: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::JobStatus;

    #[test]
    fn display_and_parse_round_trip() {
        for status in [
            JobStatus::Pending,
            JobStatus::Started,
            JobStatus::Success,
            JobStatus::Failed("extraction service returned 500".to_string()),
        ] {
            let text = status.to_string();
            assert_eq!(JobStatus::parse(&text), Some(status));
        }
    }

    #[test]
    fn only_success_and_fail_are_terminal() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Started.is_terminal());
        assert!(JobStatus::Success.is_terminal());
        assert!(JobStatus::Failed("boom".to_string()).is_terminal());
    }

    #[test]
    fn parse_rejects_unrelated_text() {
        assert_eq!(JobStatus::parse("DONE"), None);
        assert_eq!(JobStatus::parse(""), None);
    }
}
