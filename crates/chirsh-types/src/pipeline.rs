//! Pipeline model: stages connected by pipes plus a background flag.

use std::fmt;

/// One command (program + arguments) within a pipeline.
///
/// A stage always has at least one argument; the first is the program name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    args: Vec<String>,
}

impl Stage {
    /// Build a stage from an argument vector. Returns `None` for an empty vector.
    pub fn new(args: Vec<String>) -> Option<Self> {
        if args.is_empty() {
            None
        } else {
            Some(Self { args })
        }
    }

    /// The program name (first argument).
    pub fn program(&self) -> &str {
        &self.args[0]
    }

    /// All arguments, program name included.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Arguments after the program name.
    pub fn operands(&self) -> &[String] {
        &self.args[1..]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args.join(" "))
    }
}

/// An ordered sequence of stages plus a background flag.
///
/// Immutable once constructed. Empty stages are dropped on construction, so
/// every stage in a pipeline has a program name. An empty pipeline is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
    background: bool,
}

impl Pipeline {
    /// Build a pipeline, discarding stages with no arguments.
    pub fn new<I>(stages: I, background: bool) -> Self
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        Self {
            stages: stages.into_iter().filter_map(Stage::new).collect(),
            background,
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    /// The only stage, if this pipeline has exactly one.
    pub fn single(&self) -> Option<&Stage> {
        match self.stages.as_slice() {
            [stage] => Some(stage),
            _ => None,
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{stage}")?;
        }
        if self.background {
            write!(f, " &")?;
        }
        Ok(())
    }
}
