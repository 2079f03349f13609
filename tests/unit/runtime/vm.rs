use super::*;
use serde_json::{Value, json};

fn script(value: Value) -> CompiledScript {
    match serde_json::from_value(value) {
        Ok(script) => script,
        Err(e) => panic!("script fixture does not parse: {e}"),
    }
}

fn main_only(instructions: Vec<Value>) -> CompiledScript {
    script(json!({ "main": instructions }))
}

fn num(value: f64) -> Value {
    json!({ "op": "load_const_number", "value": value })
}

fn text(value: &str) -> Value {
    json!({ "op": "load_const_string", "value": value })
}

fn load(name: &str) -> Value {
    json!({ "op": "load_scope_value", "name": name })
}

fn reference(name: &str) -> Value {
    json!({ "op": "load_scope_reference", "name": name })
}

fn declare(name: &str) -> Value {
    json!({ "op": "declare_local_value", "name": name })
}

fn store(name: &str) -> Value {
    json!({ "op": "store_scope_value", "name": name })
}

fn global(name: &str, argc: usize) -> Value {
    json!({ "op": "call_global", "name": name, "argc": argc })
}

fn member(name: &str, argc: usize) -> Value {
    json!({ "op": "call_member", "name": name, "argc": argc })
}

fn pop() -> Value {
    json!({ "op": "pop" })
}

fn if_then(body: Vec<Value>) -> Value {
    json!({ "op": "if_else", "if_branch": body })
}

fn looped(body: Vec<Value>) -> Value {
    json!({ "op": "loop", "body": body })
}

fn print(format: &str, variable: &str) -> Vec<Value> {
    vec![text(format), load(variable), global("Print", 2), pop()]
}

/// `HeightMap.Flat()` left on the stack.
fn flat_map() -> Vec<Value> {
    vec![load("HeightMap"), member("Flat", 0)]
}

fn start(script: &CompiledScript) -> VirtualMachine<'_> {
    start_with(script, VmConfig::default())
}

fn start_with(script: &CompiledScript, config: VmConfig) -> VirtualMachine<'_> {
    let parameters = script.create_script_parameters().unwrap();
    VirtualMachine::new(script, parameters, config).unwrap()
}

fn run_err(script: &CompiledScript) -> ReliefError {
    let mut vm = start(script);
    let err = vm.run().unwrap_err();
    assert_eq!(vm.status(), MachineStatus::Faulted);
    err
}

#[test]
fn empty_script_finishes_and_refuses_further_steps() {
    let s = main_only(vec![]);
    let mut vm = start(&s);
    assert_eq!(vm.status(), MachineStatus::Ready);
    assert_eq!(vm.call_depth(), 1);
    vm.run().unwrap();
    assert_eq!(vm.status(), MachineStatus::Finished);
    assert_eq!(vm.call_depth(), 0);
    assert!(matches!(vm.step(), Err(ReliefError::ApiUsage(_))));
}

#[test]
fn steps_one_instruction_at_a_time() {
    let s = main_only(vec![num(1.0), pop()]);
    let mut vm = start(&s);
    assert_eq!(vm.step().unwrap(), StepResult::Running);
    assert_eq!(vm.object_stack_len(), 1);
    assert_eq!(vm.step().unwrap(), StepResult::Finished);
    assert_eq!(vm.object_stack_len(), 0);
}

#[test]
fn yielding_records_a_yield_step() {
    let mut main = flat_map();
    main.push(json!({ "op": "yield_as_main" }));
    let s = main_only(main);
    let mut vm = start(&s);
    vm.run().unwrap();

    assert!(vm.generated_maps().contains("main"));
    let steps = vm.rendering_sequence().steps();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[1].target, steps[0].target);
    assert_eq!(
        steps[1].kind,
        StepKind::Yield {
            name: "main".to_string(),
            render_rect: Rectangle::from_intervals(
                Interval::new(0, RENDER_SIZE_DEFAULT),
                Interval::new(0, RENDER_SIZE_DEFAULT),
            ),
        }
    );
    assert_eq!(vm.take_rendering_sequence().len(), 2);
    assert!(vm.rendering_sequence().is_empty());
}

#[test]
fn yield_errors() {
    let s = main_only(vec![num(1.0), json!({ "op": "yield_as_main" })]);
    assert_eq!(run_err(&s).code(), Some(ErrorCode::IncorrectYieldType));

    let mut main = flat_map();
    main.push(json!({ "op": "yield_as_named", "name": "water", "location": { "line": 6, "column": 1 } }));
    let s = main_only(main);
    let err = run_err(&s);
    assert_eq!(err.code(), Some(ErrorCode::UnsupportedMapName));
    assert_eq!(err.location(), Some(CodeLocation::new(6, 1)));
}

#[test]
fn disabled_maps_count_as_generated_without_a_step() {
    let mut main = flat_map();
    main.push(json!({ "op": "yield_as_named", "name": "water" }));
    let s = script(json!({ "main": main, "supported_maps": ["water"] }));
    let mut parameters = s.create_script_parameters().unwrap();
    parameters.enabled_maps = vec!["main".to_string()];
    let mut vm = VirtualMachine::new(&s, parameters, VmConfig::default()).unwrap();
    vm.run().unwrap();
    assert!(vm.generated_maps().contains("water"));
    assert_eq!(vm.rendering_sequence().len(), 1);
}

#[test]
fn mandatory_main_map() {
    let s = script(json!({ "main": [], "configuration": { "main_map_is_mandatory": true } }));
    assert_eq!(run_err(&s).code(), Some(ErrorCode::MainMapNotGenerated));
}

#[test]
fn loop_with_break_and_continue() {
    // i = 0; s = 0
    // loop { ++i; if (i > 4) break; if (i == 2) continue; s = s + i; }
    let mut body = vec![reference("i"), global("++pre", 1), pop()];
    body.extend([
        load("i"),
        num(4.0),
        global(">", 2),
        if_then(vec![json!({ "op": "break", "depth": 2 })]),
        load("i"),
        num(2.0),
        global("==", 2),
        if_then(vec![json!({ "op": "continue", "depth": 2 })]),
        load("s"),
        load("i"),
        global("+", 2),
        store("s"),
        pop(),
    ]);
    let mut main = vec![num(0.0), declare("i"), num(0.0), declare("s"), looped(body)];
    main.extend(print("s={0}", "s"));
    main.extend(print("i={0}", "i"));

    let s = main_only(main);
    let mut vm = start(&s);
    vm.run().unwrap();
    assert_eq!(vm.messages(), ["s=8", "i=5"]);
}

#[test]
fn malformed_break_is_an_intermediate_code_error() {
    let s = main_only(vec![json!({ "op": "break" })]);
    assert!(matches!(run_err(&s), ReliefError::IntermediateCode(_)));

    let s = main_only(vec![json!({ "op": "block", "body": [{ "op": "break", "depth": 1 }] })]);
    assert!(matches!(run_err(&s), ReliefError::IntermediateCode(_)));
}

#[test]
fn script_functions_bind_parameters_and_return() {
    let mut main = vec![num(21.0), global("double", 1), declare("r")];
    main.extend(print("r={0}", "r"));
    main.extend([num(1.0), global("nothing", 1), declare("n")]);
    main.extend(print("n={0}", "n"));
    let s = script(json!({
        "main": main,
        "functions": {
            "double": {
                "parameters": ["x"],
                "body": [load("x"), num(2.0), global("*", 2), { "op": "return" }]
            },
            "nothing": { "parameters": ["x"], "body": [] }
        }
    }));
    let mut vm = start(&s);
    vm.run().unwrap();
    assert_eq!(vm.messages(), ["r=42", "n=null"]);

    let s = script(json!({
        "main": [global("double", 0)],
        "functions": { "double": { "parameters": ["x"], "body": [] } }
    }));
    assert_eq!(run_err(&s).code(), Some(ErrorCode::IncorrectNumberOfArguments));
}

#[test]
fn function_locals_do_not_see_the_callers_locals() {
    let s = script(json!({
        "main": [num(1.0), declare("secret"), global("peek", 0), pop()],
        "functions": { "peek": { "body": [load("secret"), { "op": "return" }] } }
    }));
    assert_eq!(run_err(&s).code(), Some(ErrorCode::UndefinedVariable));
}

#[test]
fn recursion_hits_the_call_stack_limit() {
    let s = script(json!({
        "main": [global("again", 0)],
        "functions": { "again": { "body": [global("again", 0)] } }
    }));
    let config = VmConfig {
        call_stack_limit: 8,
        ..VmConfig::default()
    };
    let mut vm = start_with(&s, config);
    let err = vm.run().unwrap_err();
    assert!(matches!(err, ReliefError::ResourceLimit(_)));
    assert_eq!(err.code(), Some(ErrorCode::CallStackOverflow));
    assert_eq!(vm.call_depth(), 8);
}

#[test]
fn rendering_sequence_length_is_limited() {
    let mut main = flat_map();
    main.push(pop());
    main.extend(flat_map());
    let s = main_only(main);
    let config = VmConfig {
        max_rendering_sequence_length: 1,
        ..VmConfig::default()
    };
    let mut vm = start_with(&s, config);
    let err = vm.run().unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::RenderingSequenceTooLong));
}

#[test]
fn variable_errors() {
    let s = main_only(vec![load("missing")]);
    assert_eq!(run_err(&s).code(), Some(ErrorCode::UndefinedVariable));

    let s = main_only(vec![num(1.0), store("HeightMap")]);
    assert_eq!(run_err(&s).code(), Some(ErrorCode::ReadOnlyWrite));

    let s = main_only(vec![num(1.0), declare("a"), num(2.0), declare("a")]);
    assert_eq!(run_err(&s).code(), Some(ErrorCode::VariableAlreadyDefined));

    let s = main_only(vec![
        num(1.0),
        json!({ "op": "declare_global_value", "name": "Direction" }),
    ]);
    assert_eq!(run_err(&s).code(), Some(ErrorCode::VariableAlreadyDefined));
}

#[test]
fn conditions_must_be_boolean() {
    let s = main_only(vec![num(1.0), if_then(vec![])]);
    assert_eq!(run_err(&s).code(), Some(ErrorCode::IncorrectConditionResultType));
}

#[test]
fn globals_are_visible_from_functions() {
    let mut main = vec![global("read", 0), declare("v")];
    main.extend(print("v={0}", "v"));
    let s = script(json!({
        "main": main,
        "globals": [{ "name": "G", "is_const": true, "initial": "shared" }],
        "functions": { "read": { "body": [load("G"), { "op": "return" }] } }
    }));
    let mut vm = start(&s);
    vm.run().unwrap();
    assert_eq!(vm.messages(), ["v=shared"]);
}

#[test]
fn parameters_object_reads_run_settings() {
    let mut main = vec![
        load("Parameters"),
        json!({ "op": "load_member_value", "name": "MapWidth" }),
        declare("w"),
    ];
    main.extend(print("w={0}", "w"));
    let s = script(json!({
        "main": main,
        "metadata": { "Width": { "KeyValue": { "Default": { "Number": 300 } } } }
    }));
    let mut vm = start(&s);
    vm.run().unwrap();
    assert_eq!(vm.messages(), ["w=300"]);
}

#[test]
fn render_rectangle_clips_to_finite_maps() {
    let s = script(json!({
        "main": [],
        "metadata": { "Width": { "KeyValue": { "Default": { "Number": 300 } } } }
    }));
    let mut parameters = s.create_script_parameters().unwrap();
    parameters.render_origin.x = 100;
    parameters.render_origin.y = -50;
    let vm = VirtualMachine::new(&s, parameters, VmConfig::default()).unwrap();
    assert_eq!(
        vm.render_rectangle(),
        Rectangle::from_intervals(Interval::new(100, 200), Interval::new(-50, RENDER_SIZE_DEFAULT))
    );

    let mut parameters = s.create_script_parameters().unwrap();
    parameters.render_width = 50;
    parameters.render_height = 20;
    let vm = VirtualMachine::new(&s, parameters, VmConfig::default()).unwrap();
    assert_eq!(
        vm.render_rectangle(),
        Rectangle::from_intervals(Interval::new(0, 50), Interval::new(0, 20))
    );
}

#[test]
fn new_rejects_foreign_arguments_and_bad_scales() {
    let plain = main_only(vec![]);
    let declaring = script(json!({
        "main": [],
        "metadata": { "Parameters": { "KeyValue": {
            "Rivers": { "KeyValue": { "Default": { "Boolean": true } } }
        } } }
    }));
    let foreign = declaring.create_script_parameters().unwrap();
    assert!(matches!(
        VirtualMachine::new(&plain, foreign, VmConfig::default()),
        Err(ReliefError::ApiUsage(_))
    ));

    let mut parameters = plain.create_script_parameters().unwrap();
    parameters.render_scale = 20.0;
    assert!(matches!(
        VirtualMachine::new(&plain, parameters, VmConfig::default()),
        Err(ReliefError::ApiUsage(_))
    ));
}

#[test]
fn dump_lists_the_machine_sections() {
    let s = main_only(vec![num(1.0)]);
    let vm = start(&s);
    let dump = vm.dump();
    for section in ["status: ready", "call stack:", "object stack:", "globals:", "memory:"] {
        assert!(dump.contains(section), "missing {section} in\n{dump}");
    }
}
