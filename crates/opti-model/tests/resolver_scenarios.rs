use opti_core::{ParameterType, Value, ValueRange};
use opti_model::{
    resolve, Model, ModelParameter, Parameter, Run, Template, TemplateParameter, ValidationError,
};

/// Model with `budget: DOUBLE`, range [0, 100], default 50.
fn budget_model() -> Model {
    let mut model = Model::new("m1", "surgery schedule");
    model.parameters = vec![ModelParameter::new(
        "budget",
        Some(Value::Double(50.0)),
        ParameterType::Double,
        Some(ValueRange::new(
            Some(Value::Double(0.0)),
            Some(Value::Double(100.0)),
        )),
    )
    .unwrap()];
    model
}

fn run_with(params: Vec<Parameter>) -> Run {
    let mut run = Run::new("t1", "m1");
    run.parameters = params;
    run
}

#[test]
fn empty_template_resolves_to_fixed_model_default() {
    let model = budget_model();
    let template = Template::new("t1", "m1");

    let resolved = resolve(&model, &template, &run_with(vec![])).unwrap();
    assert_eq!(resolved.parameters.len(), 1);
    assert_eq!(
        resolved.parameter("budget").unwrap().value,
        Some(Value::Double(50.0))
    );
}

#[test]
fn run_cannot_override_undeclared_parameter() {
    // the template declares nothing, so budget is synthesized fixed
    let model = budget_model();
    let template = Template::new("t1", "m1");

    let run = run_with(vec![Parameter::new("budget", Some(Value::Double(70.0)))]);
    let err = resolve(&model, &template, &run).unwrap_err();
    assert!(matches!(err, ValidationError::ImmutableParameter { name } if name == "budget"));
}

#[test]
fn run_cannot_override_fixed_preset_regardless_of_value() {
    let model = budget_model();
    let mut template = Template::new("t1", "m1");
    template
        .parameters
        .push(TemplateParameter::fixed("budget", Some(Value::Double(60.0))));

    // even the preset's own value is not accepted as an override
    let run = run_with(vec![Parameter::new("budget", Some(Value::Double(60.0)))]);
    let err = resolve(&model, &template, &run).unwrap_err();
    assert!(matches!(err, ValidationError::ImmutableParameter { .. }));
}

#[test]
fn free_preset_is_used_when_run_omits_it() {
    let model = budget_model();
    let mut template = Template::new("t1", "m1");
    template
        .parameters
        .push(TemplateParameter::new("budget", Some(Value::Double(60.0))));

    let resolved = resolve(&model, &template, &run_with(vec![])).unwrap();
    assert_eq!(
        resolved.parameter("budget").unwrap().value,
        Some(Value::Double(60.0))
    );
}

#[test]
fn run_override_wins_over_free_preset() {
    let model = budget_model();
    let mut template = Template::new("t1", "m1");
    template
        .parameters
        .push(TemplateParameter::new("budget", Some(Value::Double(60.0))));

    let run = run_with(vec![Parameter::new("budget", Some(Value::Double(30.0)))]);
    let resolved = resolve(&model, &template, &run).unwrap();
    assert_eq!(
        resolved.parameter("budget").unwrap().value,
        Some(Value::Double(30.0))
    );
}

#[test]
fn out_of_range_override_is_a_constraint_violation() {
    let model = budget_model();
    let mut template = Template::new("t1", "m1");
    template
        .parameters
        .push(TemplateParameter::new("budget", Some(Value::Double(60.0))));

    let run = run_with(vec![Parameter::new("budget", Some(Value::Double(150.0)))]);
    let err = resolve(&model, &template, &run).unwrap_err();
    assert!(matches!(err, ValidationError::ConstraintViolation { name, .. } if name == "budget"));
}

#[test]
fn resolution_is_total_over_model_parameter_names() {
    let mut model = budget_model();
    model.parameters.push(
        ModelParameter::new("horizon", Some(Value::Int(14)), ParameterType::Int, None).unwrap(),
    );
    model.parameters.push(
        ModelParameter::new(
            "strategy",
            Some(Value::Str("greedy".into())),
            ParameterType::String,
            None,
        )
        .unwrap(),
    );

    let mut template = Template::new("t1", "m1");
    template
        .parameters
        .push(TemplateParameter::new("horizon", Some(Value::Int(28))));

    let run = run_with(vec![Parameter::new("horizon", Some(Value::Int(7)))]);
    let resolved = resolve(&model, &template, &run).unwrap();

    let mut names: Vec<&str> = resolved.parameters.iter().map(|p| p.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["budget", "horizon", "strategy"]);
    assert_eq!(
        resolved.parameter("horizon").unwrap().value,
        Some(Value::Int(7))
    );
    assert_eq!(
        resolved.parameter("strategy").unwrap().value,
        Some(Value::Str("greedy".into()))
    );
}

#[test]
fn int_override_of_double_parameter_is_accepted() {
    let model = budget_model();
    let mut template = Template::new("t1", "m1");
    template
        .parameters
        .push(TemplateParameter::new("budget", Some(Value::Double(60.0))));

    // an INT override of a DOUBLE parameter passes validation untouched
    let run = run_with(vec![Parameter::new("budget", Some(Value::Int(30)))]);
    let resolved = resolve(&model, &template, &run).unwrap();
    assert_eq!(
        resolved.parameter("budget").unwrap().value,
        Some(Value::Int(30))
    );
}

#[test]
fn template_for_wrong_model_is_rejected() {
    let model = budget_model();
    let template = Template::new("t1", "another-model");
    let mut run = Run::new("t1", "another-model");
    run.parameters = vec![];
    let err = resolve(&model, &template, &run).unwrap_err();
    assert!(matches!(err, ValidationError::ReferenceMismatch { .. }));
}

#[test]
fn empty_model_with_parameterless_template_and_run_is_valid() {
    let model = Model::new("m1", "empty");
    let template = Template::new("t1", "m1");
    let resolved = resolve(&model, &template, &run_with(vec![])).unwrap();
    assert!(resolved.parameters.is_empty());
}

#[test]
fn empty_model_with_template_parameters_is_rejected() {
    let model = Model::new("m1", "empty");
    let mut template = Template::new("t1", "m1");
    template
        .parameters
        .push(TemplateParameter::new("budget", Some(Value::Double(1.0))));
    let err = resolve(&model, &template, &run_with(vec![])).unwrap_err();
    assert!(matches!(err, ValidationError::UnknownParameter { .. }));
}

#[test]
fn empty_model_with_run_parameters_is_rejected() {
    let model = Model::new("m1", "empty");
    let template = Template::new("t1", "m1");
    let run = run_with(vec![Parameter::new("budget", Some(Value::Double(1.0)))]);
    let err = resolve(&model, &template, &run).unwrap_err();
    assert!(matches!(err, ValidationError::UnknownParameter { .. }));
}
