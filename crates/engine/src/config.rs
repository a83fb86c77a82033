//! Machine-wide DCOM configuration values.
//!
//! Field changes accumulate in a plain struct and hit the store only on an
//! explicit [`MachineConfig::commit`]; there is no per-field auto-commit.
//! [`MachineConfig::with_batch`] wraps the common load-edit-commit cycle.
//!
//! Each field maps to one named store value through a fixed table, so a
//! renamed or missing field is a compile error rather than a silently
//! skipped setting.

use tracing::info;

use crate::error::EngineError;
use crate::store::{PermissionStore, SettingValue};

const ENABLE_DCOM: &str = "EnableDCOM";
const ENABLE_DCOM_HTTP: &str = "EnableDCOMHTTP";
const AUTHENTICATION_LEVEL: &str = "LegacyAuthenticationLevel";
const IMPERSONATION_LEVEL: &str = "LegacyImpersonationLevel";
const SECURE_REFERENCES: &str = "LegacySecureReferences";

/// Machine-wide settings of the RPC authorization subsystem.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct MachineConfig {
    /// Whether distributed COM is enabled on the machine at all.
    pub dcom_enabled: bool,
    /// Whether COM internet services (tunneling over HTTP) are enabled.
    pub internet_services_enabled: bool,
    /// Default authentication level, 0 (default) through 6 (packet privacy).
    pub default_authentication_level: u32,
    /// Default impersonation level, 1 (anonymous) through 4 (delegate).
    pub default_impersonation_level: u32,
    /// Whether reference counts are tracked with authenticated calls.
    pub secure_references_enabled: bool,
}

/// One row of the field table: a store value name plus how to read it into
/// and write it out of a [`MachineConfig`].
struct ConfigField {
    value_name: &'static str,
    apply: fn(&mut MachineConfig, &SettingValue) -> Result<(), EngineError>,
    project: fn(&MachineConfig) -> SettingValue,
}

fn flag(value: &SettingValue) -> bool {
    matches!(value, SettingValue::Text(text) if text.eq_ignore_ascii_case("y"))
}

fn flag_value(enabled: bool) -> SettingValue {
    SettingValue::Text(if enabled { "Y" } else { "N" }.to_owned())
}

fn level(
    name: &'static str,
    value: &SettingValue,
    lo: u32,
    hi: u32,
) -> Result<u32, EngineError> {
    let SettingValue::Number(n) = value else {
        return Err(EngineError::InvalidSetting {
            name,
            detail: format!("expected a number, got {value:?}"),
        });
    };
    if (lo..=hi).contains(n) {
        Ok(*n)
    } else {
        Err(EngineError::InvalidSetting {
            name,
            detail: format!("{n} outside {lo}..={hi}"),
        })
    }
}

const FIELDS: &[ConfigField] = &[
    ConfigField {
        value_name: ENABLE_DCOM,
        apply: |config, value| {
            config.dcom_enabled = flag(value);
            Ok(())
        },
        project: |config| flag_value(config.dcom_enabled),
    },
    ConfigField {
        value_name: ENABLE_DCOM_HTTP,
        apply: |config, value| {
            config.internet_services_enabled = flag(value);
            Ok(())
        },
        project: |config| flag_value(config.internet_services_enabled),
    },
    ConfigField {
        value_name: AUTHENTICATION_LEVEL,
        apply: |config, value| {
            config.default_authentication_level = level(AUTHENTICATION_LEVEL, value, 0, 6)?;
            Ok(())
        },
        project: |config| SettingValue::Number(config.default_authentication_level),
    },
    ConfigField {
        value_name: IMPERSONATION_LEVEL,
        apply: |config, value| {
            config.default_impersonation_level = level(IMPERSONATION_LEVEL, value, 1, 4)?;
            Ok(())
        },
        project: |config| SettingValue::Number(config.default_impersonation_level),
    },
    ConfigField {
        value_name: SECURE_REFERENCES,
        apply: |config, value| {
            config.secure_references_enabled = flag(value);
            Ok(())
        },
        project: |config| flag_value(config.secure_references_enabled),
    },
];

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            dcom_enabled: true,
            internet_services_enabled: false,
            default_authentication_level: 2,
            default_impersonation_level: 2,
            secure_references_enabled: false,
        }
    }
}

impl MachineConfig {
    /// The subsystem's built-in defaults, independent of any store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the current configuration from `store`. Values the store does
    /// not hold keep their built-in defaults.
    pub fn load<S: PermissionStore>(store: &S) -> Result<Self, EngineError> {
        let mut config = Self::default();
        for field in FIELDS {
            if let Some(value) = store.read_setting(field.value_name)? {
                (field.apply)(&mut config, &value)?;
            }
        }
        Ok(config)
    }

    /// Validates every field and writes the whole configuration to `store`.
    pub fn commit<S: PermissionStore>(&self, store: &mut S) -> Result<(), EngineError> {
        self.validate()?;
        for field in FIELDS {
            store.write_setting(field.value_name, (field.project)(self))?;
        }
        info!(config = ?self, "machine configuration committed");
        Ok(())
    }

    /// Loads the configuration, applies `edit`, and commits the result.
    pub fn with_batch<S: PermissionStore>(
        store: &mut S,
        edit: impl FnOnce(&mut Self),
    ) -> Result<Self, EngineError> {
        let mut config = Self::load(store)?;
        edit(&mut config);
        config.commit(store)?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.default_authentication_level > 6 {
            return Err(EngineError::InvalidSetting {
                name: AUTHENTICATION_LEVEL,
                detail: format!("{} outside 0..=6", self.default_authentication_level),
            });
        }
        if !(1..=4).contains(&self.default_impersonation_level) {
            return Err(EngineError::InvalidSetting {
                name: IMPERSONATION_LEVEL,
                detail: format!("{} outside 1..=4", self.default_impersonation_level),
            });
        }
        Ok(())
    }
}
