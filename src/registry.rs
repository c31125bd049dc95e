//! Command line flags understood by the MATLAB executable.
//!
//! The table order is the order flags appear in every built command.
//! See <https://www.mathworks.com/help/matlab/ref/matlabwindows.html>.

use crate::options::{FlagValue, Options};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagDef {
  pub name: &'static str,
  pub description: &'static str,
}

pub static FLAGS: &[FlagDef] = &[
  FlagDef {
    name: "nodesktop",
    description: "Launch a command window instead of the full desktop",
  },
  FlagDef {
    name: "noFigureWindows",
    description: "Disable the display of figure windows",
  },
  FlagDef {
    name: "nosplash",
    description: "Do not display the splash screen during startup",
  },
  FlagDef {
    name: "sd",
    description: "Set the MATLAB folder to the given folder",
  },
  FlagDef {
    name: "useStartupFolderPref",
    description: "Start in the initial working folder from General Preferences",
  },
  FlagDef {
    name: "logfile",
    description: "Copy Command Window output, including error reports, to a file",
  },
  FlagDef {
    name: "jbd",
    description: "Enable the Java debugger (default port 4444)",
  },
  FlagDef {
    name: "singleCompThread",
    description: "Limit MATLAB to a single computational thread",
  },
  FlagDef {
    name: "nouserjavapath",
    description: "Disable use of javaclasspath.txt and javalibrarypath.txt",
  },
  FlagDef {
    name: "softwareopengl",
    description: "Force MATLAB to start with software OpenGL libraries",
  },
  FlagDef {
    name: "nosoftwareopengl",
    description: "Disable auto-selection of OpenGL software",
  },
  FlagDef {
    name: "automation",
    description: "Start as a COM Automation server, minimized and without splash",
  },
  FlagDef {
    name: "regserver",
    description: "Register MATLAB as a COM Automation server",
  },
  FlagDef {
    name: "unregserver",
    description: "Remove MATLAB COM server entries from the registry",
  },
  FlagDef {
    name: "wait",
    description: "Block the calling script until results are generated",
  },
];

pub fn lookup(name: &str) -> Option<&'static FlagDef> {
  FLAGS.iter().find(|flag| flag.name == name)
}

pub fn is_valid(name: &str) -> bool {
  lookup(name).is_some()
}

pub fn names() -> Vec<&'static str> {
  FLAGS.iter().map(|flag| flag.name).collect()
}

/// Every flag starts out inactive.
pub fn default_value() -> FlagValue {
  FlagValue::Bool(false)
}

pub fn default_options() -> Options {
  Options::default()
}
