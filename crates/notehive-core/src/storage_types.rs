use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// This enum defines the available storage backend types. It's defined in
/// core because it's used in configuration and in the catalogued metadata:
/// a record's backend tag plus its storage key are together sufficient to
/// retrieve the original bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    S3,
    Drive,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "s3" => Ok(StorageBackend::S3),
            "drive" => Ok(StorageBackend::Drive),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::Local => write!(f, "local"),
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Drive => write!(f, "drive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_round_trips_through_str() {
        for backend in [
            StorageBackend::Local,
            StorageBackend::S3,
            StorageBackend::Drive,
        ] {
            let parsed: StorageBackend = backend.to_string().parse().unwrap();
            assert_eq!(parsed, backend);
        }
    }

    #[test]
    fn test_backend_parse_is_case_insensitive() {
        assert_eq!(
            "DRIVE".parse::<StorageBackend>().unwrap(),
            StorageBackend::Drive
        );
        assert_eq!("S3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!("nfs".parse::<StorageBackend>().is_err());
    }
}
