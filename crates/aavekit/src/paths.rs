use directories::ProjectDirs;
use eyre::ContextCompat as _;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AavekitPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
}

impl AavekitPaths {
    pub fn discover() -> eyre::Result<Self> {
        let overridden = |var: &str| {
            std::env::var(var)
                .ok()
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };

        // Each dir can be overridden on its own (tests, containers).
        let (config_dir, data_dir) = match (
            overridden("AAVEKIT_CONFIG_DIR"),
            overridden("AAVEKIT_DATA_DIR"),
        ) {
            (Some(c), Some(d)) => (c, d),
            (c, d) => {
                let proj = ProjectDirs::from("", "", "aavekit")
                    .context("failed to resolve project dirs")?;
                (
                    c.unwrap_or_else(|| proj.config_dir().to_path_buf()),
                    d.unwrap_or_else(|| proj.data_dir().to_path_buf()),
                )
            }
        };

        let log_file = data_dir.join("aavekit.log.jsonl");
        Ok(Self {
            config_dir,
            data_dir,
            log_file,
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn ensure_private_dirs(&self) -> eyre::Result<()> {
        crate::fsutil::ensure_private_dir(&self.config_dir)?;
        crate::fsutil::ensure_private_dir(&self.data_dir)?;
        Ok(())
    }
}
