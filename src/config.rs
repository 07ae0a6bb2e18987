use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clock::Session;
use crate::error::ArgusError;
use crate::schedule::ActivityWindow;

///Display options for [crate::tracker::OrderActivityTracker].
///
///Every field has a default so a config file only needs to name what it changes.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TrackerOptions {
    ///Show cash only when it is negative.
    pub log_neg_cash: bool,
    ///Show cash on every line.
    pub log_cash: bool,
    ///Append the last four characters of the order id.
    pub log_ids: bool,
    ///Log orders that saw a bar without filling. Stop and limit orders are never logged here.
    pub log_unfilled: bool,
    ///Dates (YYYY-MM-DD, exchange-local) that switch logging on.
    pub start: Vec<String>,
    ///Dates (YYYY-MM-DD, exchange-local) that switch logging off.
    pub stop: Vec<String>,
    pub session: Session,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            log_neg_cash: true,
            log_cash: false,
            log_ids: true,
            log_unfilled: true,
            start: Vec::new(),
            stop: Vec::new(),
            session: Session::default(),
        }
    }
}

impl TrackerOptions {
    pub fn from_json(value: &str) -> Result<Self, ArgusError> {
        let options: TrackerOptions = serde_json::from_str(value)?;
        //Fail on load rather than on the first tick
        options.window()?;
        options.session.timezone.validate()?;
        Ok(options)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ArgusError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ArgusError::InvalidConfig {
            reason: format!("{}: {}", path.display(), e),
        })?;
        Self::from_json(&contents)
    }

    pub fn window(&self) -> Result<ActivityWindow, ArgusError> {
        ActivityWindow::new(&self.start, &self.stop)
    }

    pub(crate) fn show_cash(&self, cash: f64) -> bool {
        self.log_cash || (self.log_neg_cash && cash < 0.0)
    }
}
