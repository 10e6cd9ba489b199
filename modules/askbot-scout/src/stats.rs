use std::fmt;

use askbot_common::SourceKind;

/// Where a post failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Generate,
    Deadline,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => write!(f, "fetch"),
            Self::Generate => write!(f, "generate"),
            Self::Deadline => write!(f, "deadline"),
            Self::Publish => write!(f, "publish"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub url: String,
    pub stage: Stage,
    pub error: String,
}

impl Failure {
    pub fn new(url: &str, stage: Stage, error: impl fmt::Display) -> Self {
        Self {
            url: url.to_string(),
            stage,
            error: error.to_string(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed at {}: {}", self.url, self.stage, self.error)
    }
}

/// Stats from a single run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub source: Option<SourceKind>,
    pub candidates: u32,
    pub selected: u32,
    pub already_answered: u32,
    pub answered: u32,
    pub published: u32,
    pub dry_run: bool,
    pub failures: Vec<Failure>,
}

impl RunStats {
    pub fn failed(&self, stage: Stage) -> usize {
        self.failures.iter().filter(|f| f.stage == stage).count()
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Askbot Run Complete ===")?;
        if let Some(source) = self.source {
            writeln!(f, "Source:            {source}")?;
        }
        writeln!(f, "Candidates:        {}", self.candidates)?;
        writeln!(f, "Selected:          {}", self.selected)?;
        writeln!(f, "Already answered:  {}", self.already_answered)?;
        writeln!(f, "New answers:       {}", self.answered)?;
        writeln!(f, "Published:         {}", self.published)?;
        if self.dry_run {
            writeln!(f, "(dry run: nothing saved or sent)")?;
        }
        if !self.failures.is_empty() {
            writeln!(f, "\nFailures:")?;
            for failure in &self.failures {
                writeln!(f, "  {failure}")?;
            }
        }
        Ok(())
    }
}
