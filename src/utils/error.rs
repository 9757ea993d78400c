use thiserror::Error;

#[derive(Error, Debug)]
pub enum KubecheckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no checks specified (use --all or name one or more checks)")]
    NoChecksSelected,

    #[error("unknown check: {0}")]
    UnknownCheck(String),

    #[error("check registered twice: {0}")]
    DuplicateCheck(String),

    #[error("kubectl not found or not runnable ({0})")]
    KubectlMissing(String),

    #[error("cannot reach the cluster: {0}")]
    ClusterUnreachable(String),

    #[error("kubectl error: {0}")]
    Kubectl(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("System error: {0}")]
    System(String),
}

impl KubecheckError {
    /// Process exit status for this error.
    ///
    /// Usage errors exit 2, precondition errors exit 3, anything else 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            KubecheckError::NoChecksSelected | KubecheckError::UnknownCheck(_) => 2,
            KubecheckError::KubectlMissing(_) | KubecheckError::ClusterUnreachable(_) => 3,
            _ => 1,
        }
    }

    pub fn is_usage(&self) -> bool {
        self.exit_code() == 2
    }
}

pub type Result<T> = std::result::Result<T, KubecheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors_exit_two() {
        assert_eq!(KubecheckError::NoChecksSelected.exit_code(), 2);
        assert_eq!(KubecheckError::UnknownCheck("bogus".into()).exit_code(), 2);
        assert!(KubecheckError::UnknownCheck("bogus".into()).is_usage());
    }

    #[test]
    fn precondition_errors_exit_three() {
        assert_eq!(KubecheckError::KubectlMissing("x".into()).exit_code(), 3);
        assert_eq!(KubecheckError::ClusterUnreachable("x".into()).exit_code(), 3);
    }

    #[test]
    fn runtime_errors_exit_one() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(KubecheckError::from(io).exit_code(), 1);
        assert_eq!(KubecheckError::Kubectl("x".into()).exit_code(), 1);
        assert!(!KubecheckError::Kubectl("x".into()).is_usage());
    }
}
