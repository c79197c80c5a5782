use getset::{CopyGetters, Getters};
use nic2gw_api::constants::{
    DEFAULT_GATEWAY_CLASS, DEFAULT_HTTP_PORT, DEFAULT_HTTPS_PORT, TOOL_NAME,
};
use typed_builder::TypedBuilder;

#[derive(TypedBuilder, Debug, Clone, Getters, CopyGetters, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Used when no VirtualServer in a namespace names an ingress class.
    #[getset(get = "pub")]
    #[builder(default = DEFAULT_GATEWAY_CLASS.to_string(), setter(into))]
    gateway_class: String,

    /// Value of the managed-by label and prefix of the tool-owned label keys.
    #[getset(get = "pub")]
    #[builder(default = TOOL_NAME.to_string(), setter(into))]
    tool_name: String,

    #[getset(get_copy = "pub")]
    #[builder(default = DEFAULT_HTTP_PORT)]
    http_port: u16,

    #[getset(get_copy = "pub")]
    #[builder(default = DEFAULT_HTTPS_PORT)]
    https_port: u16,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConversionOptions {
    /// `<tool>.io/<suffix>`
    pub fn label_key(&self, suffix: &str) -> String {
        format!("{}.io/{suffix}", self.tool_name)
    }
}
