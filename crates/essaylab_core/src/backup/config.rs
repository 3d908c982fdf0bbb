//! Object-store backup configuration.
//!
//! Built once at process start from settings and handed to whichever sink
//! the server wires up.

/// Server-side encryption requested on every object write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerSideEncryption {
    /// Store-managed keys (`AES256`).
    Aes256,
    /// Key-management service key (`aws:kms`).
    Kms { key_id: String },
}

/// Target bucket and write options for essay backups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStoreConfig {
    pub region: String,
    pub bucket: String,
    /// Normalized prefix: empty, or ending with exactly one `/`.
    pub prefix: String,
    /// Named credentials profile; `None` uses the default chain.
    pub profile: Option<String>,
    pub encryption: ServerSideEncryption,
}

impl ObjectStoreConfig {
    /// Returns a config only when backups are enabled and both region and
    /// bucket are set to non-blank values.
    pub fn from_settings(
        enabled: bool,
        region: Option<&str>,
        bucket: Option<&str>,
        prefix: Option<&str>,
        profile: Option<&str>,
        kms_key_id: Option<&str>,
    ) -> Option<Self> {
        if !enabled {
            return None;
        }
        let region = non_blank(region)?;
        let bucket = non_blank(bucket)?;
        let encryption = match non_blank(kms_key_id) {
            Some(key_id) => ServerSideEncryption::Kms { key_id },
            None => ServerSideEncryption::Aes256,
        };

        Some(Self {
            region,
            bucket,
            prefix: normalize_prefix(prefix.unwrap_or_default()),
            profile: non_blank(profile),
            encryption,
        })
    }

    /// Prepends the configured prefix to `key`.
    pub fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Virtual-hosted URL of an object. Private buckets still need signing.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket,
            self.region,
            self.full_key(key)
        )
    }
}

/// Normalizes a key prefix so it is either empty or ends with one `/`.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{normalize_prefix, ObjectStoreConfig, ServerSideEncryption};

    #[test]
    fn prefix_gets_single_trailing_slash() {
        assert_eq!(normalize_prefix(""), "");
        assert_eq!(normalize_prefix("writing-feedback"), "writing-feedback/");
        assert_eq!(normalize_prefix("writing-feedback//"), "writing-feedback/");
    }

    #[test]
    fn config_requires_enable_region_and_bucket() {
        assert!(ObjectStoreConfig::from_settings(false, Some("us-west-2"), Some("b"), None, None, None).is_none());
        assert!(ObjectStoreConfig::from_settings(true, None, Some("b"), None, None, None).is_none());
        assert!(ObjectStoreConfig::from_settings(true, Some("us-west-2"), Some("  "), None, None, None).is_none());
    }

    #[test]
    fn kms_key_selects_kms_encryption() {
        let config = ObjectStoreConfig::from_settings(
            true,
            Some("us-west-2"),
            Some("essays-bucket"),
            Some("writing-feedback"),
            None,
            Some("alias/essays"),
        )
        .expect("config should be enabled");
        assert_eq!(
            config.encryption,
            ServerSideEncryption::Kms {
                key_id: "alias/essays".to_string()
            }
        );
        assert_eq!(config.full_key("essays/a.txt"), "writing-feedback/essays/a.txt");
        assert_eq!(
            config.public_url("essays/a.txt"),
            "https://essays-bucket.s3.us-west-2.amazonaws.com/writing-feedback/essays/a.txt"
        );
    }
}
