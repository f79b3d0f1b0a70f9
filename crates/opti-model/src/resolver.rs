//! Three-tier parameter resolution.
//!
//! A run is created against a template, which is created against a model.
//! Resolution merges the three tiers into one validated parameter set with
//! precedence run-override > template-preset > model-default, except that a
//! fixed template preset is never overridable by a run.

use crate::error::ValidationResult;
use crate::model::Model;
use crate::run::Run;
use crate::template::Template;

/// Produce the complete, validated parameter set for a run submission.
///
/// Walks the chain in four passes:
/// 1. the template is validated against the model (id chain, duplicate
///    names, preset values within declared type/range);
/// 2. the template is populated so that every declared parameter is covered,
///    gaps becoming fixed presets carrying the model default;
/// 3. the run is validated against the populated template (id chain,
///    duplicates, unknown names, fixed overrides) and populated with every
///    preset it did not specify;
/// 4. the model re-validates every value the run now carries and injects
///    defaults for anything still missing.
///
/// On success the returned run carries exactly one parameter per declared
/// model parameter name.
pub fn resolve(model: &Model, template: &Template, run: &Run) -> ValidationResult<Run> {
    let template = model.populate_template(template)?;
    let run = template.populate_run(run)?;
    model.finalize_run(run)
}
