use std::path::{Path, PathBuf};

use crate::foundation::error::{StackError, StackResult};

/// File extensions treated as animated sources (matched ASCII case-insensitively).
pub const ANIMATED_EXTENSIONS: &[&str] = &["gif"];

/// Inputs split into the still layers and the optional animated source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputPlan {
    /// Still images in input order. The first entry is the base layer.
    pub static_paths: Vec<PathBuf>,
    /// The single animated source, if any.
    pub animated: Option<PathBuf>,
}

impl InputPlan {
    /// Returns `true` when the output will be animated.
    pub fn is_animated(&self) -> bool {
        self.animated.is_some()
    }
}

/// Returns `true` if `path` carries an animated-format extension.
pub fn is_animated_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ANIMATED_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Partition `inputs` without touching the filesystem.
pub fn classify_inputs<P: AsRef<Path>>(inputs: &[P]) -> StackResult<InputPlan> {
    if inputs.len() <= 1 {
        return Err(StackError::invalid_input(format!(
            "compositing needs at least two inputs, got {}",
            inputs.len()
        )));
    }

    let mut plan = InputPlan {
        static_paths: Vec::with_capacity(inputs.len()),
        animated: None,
    };
    for input in inputs {
        let path = input.as_ref();
        if !is_animated_path(path) {
            plan.static_paths.push(path.to_path_buf());
            continue;
        }
        if let Some(first) = &plan.animated {
            return Err(StackError::MultipleAnimated {
                first: first.clone(),
                second: path.to_path_buf(),
            });
        }
        plan.animated = Some(path.to_path_buf());
    }

    Ok(plan)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/classify.rs"]
mod tests;
