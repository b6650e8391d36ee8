use std::path::{Path, PathBuf};

/// Host directory (under the source tree) that receives the analysis results
pub const RESULTS_DIR_NAME: &str = "codeql-agent-results";

/// Per-invocation analysis options, built once from the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfiguration {
    /// Absolute path to the source tree on the host
    pub source: PathBuf,
    pub action: Option<String>,
    pub language: Option<String>,
    /// Query suite (.qls) to run
    pub query_suite: Option<String>,
    pub user_id: Option<String>,
    pub group_id: Option<String>,
    pub threads: Option<String>,
    pub overwrite_flag: Option<String>,
    pub save_cache_flag: Option<String>,
    pub java_version: Option<String>,
    /// Build command for compiled languages
    pub command: Option<String>,
}

impl RunConfiguration {
    /// Environment passed to the container, in a fixed order.
    ///
    /// Only options that were given produce an entry.
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        let fields: [(&'static str, &Option<String>); 10] = [
            ("ACTION", &self.action),
            ("LANGUAGE", &self.language),
            ("QS", &self.query_suite),
            ("USERID", &self.user_id),
            ("GROUPID", &self.group_id),
            ("THREADS", &self.threads),
            ("OVERWRITE_FLAG", &self.overwrite_flag),
            ("SAVE_CACHE_FLAG", &self.save_cache_flag),
            ("JAVA_VERSION", &self.java_version),
            ("COMMAND", &self.command),
        ];

        fields
            .into_iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (key, v.clone())))
            .collect()
    }

    /// `<source>/codeql-agent-results` on the host
    pub fn results_dir(&self) -> PathBuf {
        results_dir_for(&self.source)
    }
}

pub fn results_dir_for(source: &Path) -> PathBuf {
    source.join(RESULTS_DIR_NAME)
}
