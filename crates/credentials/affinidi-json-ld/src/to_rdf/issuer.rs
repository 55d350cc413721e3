use std::collections::HashMap;

/// Issues sequential blank node labels: `b0`, `b1`, etc.
///
/// One issuer serves a single RDF conversion pass, so labels start again at
/// `b0` for every call. Labels found in the input (`_:x`) are relabelled
/// through the same sequence.
#[derive(Clone, Debug)]
pub struct BlankNodeIssuer {
    prefix: String,
    counter: u64,
    issued: HashMap<String, String>,
}

impl Default for BlankNodeIssuer {
    fn default() -> Self {
        Self::new("b")
    }
}

impl BlankNodeIssuer {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            counter: 0,
            issued: HashMap::new(),
        }
    }

    /// A label not tied to any input identifier.
    pub fn fresh(&mut self) -> String {
        let label = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;
        label
    }

    /// The label for an input blank node identifier (without `_:`).
    /// Repeated calls with the same identifier return the same label.
    pub fn issue(&mut self, existing: &str) -> String {
        if let Some(label) = self.issued.get(existing) {
            return label.clone();
        }
        let label = self.fresh();
        self.issued.insert(existing.to_string(), label.clone());
        label
    }
}
