// Sparse override layers and their "presence wins" merge

/// Sparse container configuration. An absent, empty or zero field means "do not override".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub name: Option<String>,
    pub healthcheck: Option<String>,
    /// `KEY=VALUE` entries.
    pub env: Option<Vec<String>>,
    /// `containerPort:hostPort` entries.
    pub ports: Option<Vec<String>>,
    pub start_timeout_secs: Option<u64>,
}

impl Options {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn healthcheck(mut self, command: impl Into<String>) -> Self {
        self.healthcheck = Some(command.into());
        self
    }

    pub fn env<I, S>(mut self, env: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env = Some(env.into_iter().map(Into::into).collect());
        self
    }

    pub fn ports<I, S>(mut self, ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ports = Some(ports.into_iter().map(Into::into).collect());
        self
    }

    pub fn start_timeout_secs(mut self, secs: u64) -> Self {
        self.start_timeout_secs = Some(secs);
        self
    }

    /// Returns `self` with every present field of `layer` replacing its counterpart.
    /// Lists are replaced whole, never concatenated.
    pub fn overlay(self, layer: &Options) -> Options {
        Options {
            name: pick(self.name, &layer.name, |v| !v.is_empty()),
            healthcheck: pick(self.healthcheck, &layer.healthcheck, |v| !v.is_empty()),
            env: pick(self.env, &layer.env, |v| !v.is_empty()),
            ports: pick(self.ports, &layer.ports, |v| !v.is_empty()),
            start_timeout_secs: pick(self.start_timeout_secs, &layer.start_timeout_secs, |v| {
                *v > 0
            }),
        }
    }
}

/// Applies `layers` over `base` in order; later layers win on fields they share.
pub fn merge<'a>(base: &Options, layers: impl IntoIterator<Item = &'a Options>) -> Options {
    layers
        .into_iter()
        .fold(base.clone(), |acc, layer| acc.overlay(layer))
}

fn pick<T: Clone>(base: Option<T>, layer: &Option<T>, present: impl Fn(&T) -> bool) -> Option<T> {
    match layer {
        Some(value) if present(value) => Some(value.clone()),
        _ => base,
    }
}
