/// Session state visible to builtins.
///
/// The shell's working directory is the process working directory; `cd`
/// changes it directly and children inherit it, so it is not mirrored here.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Builtin names, in registration order, used by `help` to describe the shell.
    pub builtins: Vec<&'static str>,
}

impl Environment {
    pub fn new(builtins: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            builtins: builtins.into_iter().collect(),
        }
    }
}
