/// Everything the runtime needs to start the analysis container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    pub image: String,
    pub name: String,
    /// `KEY=value` entries, in insertion order
    pub env: Vec<String>,
    /// `host:container` bind mounts
    pub binds: Vec<String>,
    pub remove_on_exit: bool,
}
