/// Where and how a route is registered
///
/// Plain strings convert into options with only a path:
///
/// ```rust
/// use chainrouter::RouteOptions;
///
/// let plain: RouteOptions = "/users/:id".into();
/// let full = RouteOptions::new("/users/:id").name("get_user").version("2.0.0");
/// assert_eq!(plain.path(), full.path());
/// assert_eq!(full.route_name(), Some("get_user"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOptions {
    path: String,
    name: Option<String>,
    versions: Vec<String>,
}

impl RouteOptions {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Explicit route name; must be unique within the server
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add one accepted version
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.versions.push(version.into());
        self
    }

    /// Add several accepted versions
    #[must_use]
    pub fn versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.versions.extend(versions.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn route_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn route_versions(&self) -> &[String] {
        &self.versions
    }
}

impl From<&str> for RouteOptions {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for RouteOptions {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<&String> for RouteOptions {
    fn from(path: &String) -> Self {
        Self::new(path.as_str())
    }
}
