//! Multi-document YAML decoding into a conversion snapshot.

use kube::Resource;
use nic2gw_api::constants::NGINX_API_VERSION;
use nic2gw_api::nginx::{GlobalConfiguration, TransportServer, VirtualServer, VirtualServerRoute};
use nic2gw_core::ConversionInput;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("document {index} in {path} is not valid YAML")]
    Parse {
        path: PathBuf,
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("document {index} in {path} has no apiVersion or kind")]
    MissingType { path: PathBuf, index: usize },
    #[error("failed to decode {kind} in document {index} of {path}")]
    Decode {
        path: PathBuf,
        index: usize,
        kind: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Accumulates decoded NGINX resources across files.
#[derive(Debug, Default)]
pub struct Manifests {
    virtual_servers: Vec<VirtualServer>,
    virtual_server_routes: Vec<VirtualServerRoute>,
    transport_servers: Vec<TransportServer>,
    global_configuration: Option<GlobalConfiguration>,
}

fn kind_of<K: Resource<DynamicType = ()>>() -> String {
    K::kind(&()).to_string()
}

fn decode<T: DeserializeOwned>(
    value: serde_yaml::Value,
    path: &Path,
    index: usize,
    kind: &str,
) -> Result<T, ManifestError> {
    serde_yaml::from_value(value).map_err(|source| ManifestError::Decode {
        path: path.to_path_buf(),
        index,
        kind: kind.to_string(),
        source,
    })
}

impl Manifests {
    pub fn read_file(&mut self, path: &Path) -> Result<(), ManifestError> {
        let content = if path == Path::new("-") {
            std::io::read_to_string(std::io::stdin())
        } else {
            std::fs::read_to_string(path)
        }
        .map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        self.read_str(&content, path)
    }

    pub fn read_str(&mut self, content: &str, path: &Path) -> Result<(), ManifestError> {
        for (index, document) in serde_yaml::Deserializer::from_str(content).enumerate() {
            let value = serde_yaml::Value::deserialize(document).map_err(|source| {
                ManifestError::Parse {
                    path: path.to_path_buf(),
                    index,
                    source,
                }
            })?;
            if value.is_null() {
                continue;
            }
            self.add_value(value, path, index)?;
        }
        Ok(())
    }

    fn add_value(
        &mut self,
        value: serde_yaml::Value,
        path: &Path,
        index: usize,
    ) -> Result<(), ManifestError> {
        let api_version = value.get("apiVersion").and_then(serde_yaml::Value::as_str);
        let kind = value.get("kind").and_then(serde_yaml::Value::as_str);
        let (Some(api_version), Some(kind)) = (api_version, kind) else {
            return Err(ManifestError::MissingType {
                path: path.to_path_buf(),
                index,
            });
        };
        let kind = kind.to_string();

        if kind == "List" {
            let items = value
                .get("items")
                .and_then(serde_yaml::Value::as_sequence)
                .cloned()
                .unwrap_or_default();
            for item in items {
                self.add_value(item, path, index)?;
            }
            return Ok(());
        }

        if api_version != NGINX_API_VERSION {
            debug!("Ignoring {}/{} in document {} of {}", api_version, kind, index, path.display());
            return Ok(());
        }

        if kind == kind_of::<VirtualServer>() {
            self.virtual_servers.push(decode(value, path, index, &kind)?);
        } else if kind == kind_of::<VirtualServerRoute>() {
            self.virtual_server_routes.push(decode(value, path, index, &kind)?);
        } else if kind == kind_of::<TransportServer>() {
            self.transport_servers.push(decode(value, path, index, &kind)?);
        } else if kind == kind_of::<GlobalConfiguration>() {
            let global: GlobalConfiguration = decode(value, path, index, &kind)?;
            if self.global_configuration.is_some() {
                warn!(
                    "Ignoring additional GlobalConfiguration in document {} of {}",
                    index,
                    path.display()
                );
            } else {
                self.global_configuration = Some(global);
            }
        } else {
            debug!("Ignoring {} in document {} of {}", kind, index, path.display());
        }

        Ok(())
    }

    pub fn into_input(self) -> ConversionInput {
        let builder = ConversionInput::builder()
            .virtual_servers(self.virtual_servers)
            .virtual_server_routes(self.virtual_server_routes)
            .transport_servers(self.transport_servers);
        match self.global_configuration {
            Some(global) => builder.global_configuration(global).build(),
            None => builder.build(),
        }
    }
}
