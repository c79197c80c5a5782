use getset::Getters;
use kube::{Resource, ResourceExt};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use thiserror::Error;
use typed_builder::TypedBuilder;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ObjectRefError {
    #[error("Object is missing a name")]
    MissingName,
}

/// Identifies the Kubernetes object a notification or output was derived from.
#[derive(TypedBuilder, Getters, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectRef {
    #[getset(get = "pub")]
    #[builder(setter(into))]
    kind: String,

    #[getset(get = "pub")]
    #[builder(default, setter(into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<String>,

    #[getset(get = "pub")]
    #[builder(default, setter(into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,

    #[getset(get = "pub")]
    #[builder(setter(into))]
    name: String,
}

impl Display for ObjectRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.namespace() {
            Some(namespace) => write!(f, "{}/{}/{}", self.kind, namespace, self.name),
            None => write!(f, "{}/{}", self.kind, self.name),
        }
    }
}

impl ObjectRef {
    pub fn of_kind<K: Resource>(namespace: Option<String>, name: impl Into<String>) -> Self
    where
        K::DynamicType: Default,
    {
        let dynamic_type = K::DynamicType::default();
        let group = K::group(&dynamic_type);

        Self::builder()
            .kind(K::kind(&dynamic_type))
            .group((!group.is_empty()).then(|| group.to_string()))
            .namespace(namespace)
            .name(name)
            .build()
    }

    pub fn for_object<K: Resource + ResourceExt>(object: &K) -> Result<Self, ObjectRefError>
    where
        K::DynamicType: Default,
    {
        let name = object
            .meta()
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or(ObjectRefError::MissingName)?;

        Ok(Self::of_kind::<K>(object.namespace(), name))
    }

    pub fn namespaced_name(&self) -> Option<NamespacedName> {
        self.namespace
            .as_ref()
            .map(|namespace| NamespacedName::new(namespace, &self.name))
    }
}

/// Key of every IR map and of the VirtualServerRoute index.
#[derive(Getters, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NamespacedName {
    #[getset(get = "pub")]
    namespace: String,

    #[getset(get = "pub")]
    name: String,
}

impl NamespacedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn for_object<K: ResourceExt>(object: &K, default_namespace: &str) -> Self {
        Self::new(
            object
                .namespace()
                .unwrap_or_else(|| default_namespace.to_string()),
            object.name_any(),
        )
    }
}

impl Display for NamespacedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
