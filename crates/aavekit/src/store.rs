use crate::{config::AavekitConfig, paths::AavekitPaths};
use eyre::Context as _;
use std::{fs, path::PathBuf};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

/// If `var` is set to something non-blank, hand the trimmed value to `apply`.
fn env_override(var: &str, apply: impl FnOnce(&str)) {
    if let Ok(v) = std::env::var(var) {
        let t = v.trim();
        if !t.is_empty() {
            apply(t);
        }
    }
}

/// Process-level overrides. These are applied after load and never persisted.
///
/// `AAVEKIT_RPC_URL` is not handled here: it belongs to whichever network
/// ends up active, which is only known once `--network` is resolved.
pub fn apply_env_overrides(cfg: &mut AavekitConfig) {
    env_override("AAVEKIT_NETWORK_ID", |v| {
        cfg.network_id = v.to_ascii_lowercase();
    });
    env_override("AAVEKIT_PRIVATE_KEY_ENV", |v| {
        v.clone_into(&mut cfg.wallet.private_key_env);
    });
}

/// `AAVEKIT_RPC_URL`, if set. Applied by the runtime to the active network.
pub fn rpc_url_override() -> Option<String> {
    let mut url = None;
    env_override("AAVEKIT_RPC_URL", |v| url = Some(v.to_owned()));
    url
}

impl ConfigStore {
    pub fn new(paths: &AavekitPaths) -> Self {
        Self {
            path: paths.config_file(),
        }
    }

    pub fn load_or_init_default(&self) -> eyre::Result<AavekitConfig> {
        let mut cfg = if self.path.exists() {
            let s = fs::read_to_string(&self.path).context("read config.toml")?;
            toml::from_str(&s).context("parse config.toml")?
        } else {
            let cfg = AavekitConfig::default();
            self.save(&cfg)?;
            cfg
        };
        apply_env_overrides(&mut cfg);
        Ok(cfg)
    }

    pub fn save(&self, cfg: &AavekitConfig) -> eyre::Result<()> {
        let s = toml::to_string_pretty(cfg).context("serialize config.toml")?;
        crate::fsutil::write_string_atomic_restrictive(
            &self.path,
            &s,
            crate::fsutil::MODE_FILE_PRIVATE,
        )
        .context("write config.toml")
    }
}
