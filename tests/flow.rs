use dse_vm::op::{self, Operand};
use dse_vm::prelude::*;

fn program(cmds: &[Vec<u32>]) -> Vec<u8> {
    op::bytes(&cmds.concat())
}

fn run(cmds: &[Vec<u32>]) -> Interpreter<BumpAllocator> {
    let mut vm = Interpreter::in_memory();
    vm.run(&program(cmds)).expect("program must execute");
    vm
}

#[test]
fn loop_repeats_the_body() {
    let vm = run(&[
        op::reserve(0, 0x40, false),
        op::switch_focus(0),
        op::loop_cmd(0, Operand::Imm(0), Operand::Imm(4), Operand::Imm(1)),
        op::write_imm(1, 0xAA, 1),
        op::end_loop(),
        op::end_spec(),
    ]);

    let bytes = vm.region(0).unwrap().bytes();
    assert_eq!(&bytes[..4], &[0xAA; 4]);
    assert_eq!(bytes[4], 0);
    assert_eq!(vm.region(0).unwrap().write_offset(), 4);
}

#[test]
fn loop_counter_is_visible_to_the_body() {
    let vm = run(&[
        op::reserve(0, 0x40, false),
        op::switch_focus(0),
        op::loop_cmd(3, Operand::Imm(4), Operand::Imm(8), Operand::Imm(2)),
        op::write_reg(1, 3, 1),
        op::end_loop(),
        op::end_spec(),
    ]);

    assert_eq!(&vm.region(0).unwrap().bytes()[..2], &[4, 6]);
    // the counter holds its last value after the loop
    assert_eq!(vm.registers()[3], 6);
}

#[test]
fn loop_bounds_come_from_registers() {
    let vm = run(&[
        op::reserve(0, 0x40, false),
        op::switch_focus(0),
        op::mv_imm(5, 1),
        op::mv_imm(6, 4),
        op::loop_cmd(2, Operand::Reg(5), Operand::Reg(6), Operand::Imm(1)),
        op::write_reg(1, 2, 1),
        op::end_loop(),
        op::end_spec(),
    ]);

    assert_eq!(&vm.region(0).unwrap().bytes()[..3], &[1, 2, 3]);
}

#[test]
fn empty_range_skips_the_body_and_leaves_the_counter() {
    let vm = run(&[
        op::reserve(0, 0x40, false),
        op::switch_focus(0),
        op::mv_imm(7, 0xDEAD),
        op::loop_cmd(7, Operand::Imm(8), Operand::Imm(3), Operand::Imm(1)),
        op::write_imm(1, 0xAA, 1),
        op::end_loop(),
        op::end_spec(),
    ]);

    assert_eq!(vm.region(0).unwrap().write_offset(), 0);
    assert_eq!(vm.registers()[7], 0xDEAD);
}

#[test]
fn nested_loops_multiply() {
    let vm = run(&[
        op::reserve(0, 0x40, false),
        op::switch_focus(0),
        op::loop_cmd(0, Operand::Imm(0), Operand::Imm(3), Operand::Imm(1)),
        op::loop_cmd(1, Operand::Imm(0), Operand::Imm(2), Operand::Imm(1)),
        op::write_imm(1, 0x11, 1),
        op::end_loop(),
        op::end_loop(),
        op::end_spec(),
    ]);

    assert_eq!(vm.region(0).unwrap().write_offset(), 6);
}

#[test]
fn break_loop_stops_the_iteration() {
    let vm = run(&[
        op::reserve(0, 0x40, false),
        op::switch_focus(0),
        op::loop_cmd(0, Operand::Imm(0), Operand::Imm(10), Operand::Imm(1)),
        op::write_imm(1, 0xAA, 1),
        op::if_cmp(Condition::Equal, 0, Some(Operand::Imm(2))),
        op::break_loop(),
        op::end_if(),
        op::end_loop(),
        // the loop must resume here, not abort the program
        op::write_imm(1, 0xBB, 1),
        op::end_spec(),
    ]);

    let bytes = vm.region(0).unwrap().bytes();
    assert_eq!(&bytes[..4], &[0xAA, 0xAA, 0xAA, 0xBB]);
}

#[test]
fn zero_step_is_an_arithmetic_fault() {
    let mut vm = Interpreter::in_memory();
    let spec = program(&[
        op::loop_cmd(0, Operand::Imm(0), Operand::Imm(4), Operand::Imm(0)),
        op::end_loop(),
    ]);

    let err = vm.run(&spec).expect_err("zero step must fault");
    assert_eq!(err.panic_reason(), Some(PanicReason::ArithmeticError));
}

#[test]
fn loop_without_end_loop_is_unbalanced() {
    let mut vm = Interpreter::in_memory();
    let spec = program(&[
        op::loop_cmd(0, Operand::Imm(0), Operand::Imm(2), Operand::Imm(1)),
        op::nop(),
    ]);

    let err = vm.run(&spec).expect_err("missing closer must fault");
    assert_eq!(err.panic_reason(), Some(PanicReason::UnbalancedBlock));
}

#[test]
fn bare_end_loop_is_unbalanced() {
    let mut vm = Interpreter::in_memory();
    let err = vm.run(&program(&[op::end_loop()])).expect_err("must fault");
    assert_eq!(err.panic_reason(), Some(PanicReason::UnbalancedBlock));
}

fn comparator_writes(cond: Condition, left: u64, rhs: Option<u64>) -> bool {
    let cmds = [
        op::reserve(0, 0x10, false),
        op::switch_focus(0),
        op::mv_imm(1, left),
        op::if_cmp(cond, 1, rhs.map(|v| Operand::Imm(v as u32))),
        op::write_imm(1, 0xAA, 1),
        op::end_if(),
        op::end_spec(),
    ];
    let mut vm = Interpreter::in_memory();
    vm.run(&op::bytes(&cmds.concat())).expect("program must execute");
    vm.region(0).unwrap().write_offset() == 1
}

#[test]
fn comparators_direct_control_flow() {
    use Condition::*;

    assert!(!comparator_writes(Equal, 0, Some(0x1234)));
    assert!(comparator_writes(Equal, 0x1234, Some(0x1234)));
    assert!(comparator_writes(NotEqual, 0, Some(0x1234)));
    assert!(!comparator_writes(NotEqual, 0x1234, Some(0x1234)));
    assert!(comparator_writes(LessOrEqual, 0x1234, Some(0x1234)));
    assert!(comparator_writes(LessOrEqual, 3, Some(0x1234)));
    assert!(!comparator_writes(LessOrEqual, 0xFFFF_FFFF, Some(0x1234)));
    assert!(comparator_writes(Less, 3, Some(0x1234)));
    assert!(!comparator_writes(Less, 0x1234, Some(0x1234)));
    assert!(comparator_writes(GreaterOrEqual, 0x1234, Some(0x1234)));
    assert!(comparator_writes(GreaterOrEqual, 0xFFFF_FFFF, Some(0x1234)));
    assert!(!comparator_writes(GreaterOrEqual, 3, Some(0x1234)));
    assert!(comparator_writes(Greater, 0xFFFF_FFFF, Some(0x1234)));
    assert!(!comparator_writes(Greater, 0x1234, Some(0x1234)));
    assert!(comparator_writes(IsZero, 0, None));
    assert!(!comparator_writes(IsZero, 5, None));
    assert!(comparator_writes(IsNotZero, 5, None));
    assert!(!comparator_writes(IsNotZero, 0, None));
}

#[test]
fn else_branch_runs_when_the_condition_is_false() {
    let vm = run(&[
        op::reserve(0, 0x10, false),
        op::switch_focus(0),
        op::mv_imm(1, 5),
        op::if_cmp(Condition::IsZero, 1, None),
        op::write_imm(1, 0x0F, 1),
        op::else_cmd(),
        op::write_imm(1, 0x10, 1),
        op::end_if(),
        op::end_spec(),
    ]);

    let region = vm.region(0).unwrap();
    assert_eq!(region.bytes()[0], 0x10);
    assert_eq!(region.write_offset(), 1);
}

#[test]
fn taken_branch_skips_the_else() {
    let vm = run(&[
        op::reserve(0, 0x10, false),
        op::switch_focus(0),
        op::mv_imm(1, 0),
        op::if_cmp(Condition::IsZero, 1, None),
        op::write_imm(1, 0x0F, 1),
        op::else_cmd(),
        op::write_imm(1, 0x10, 1),
        op::end_if(),
        op::end_spec(),
    ]);

    let region = vm.region(0).unwrap();
    assert_eq!(region.bytes()[0], 0x0F);
    assert_eq!(region.write_offset(), 1);
}

#[test]
fn nested_conditionals_skip_as_a_block() {
    let vm = run(&[
        op::reserve(0, 0x10, false),
        op::switch_focus(0),
        op::mv_imm(1, 1),
        // outer branch not taken: everything inside, including the
        // nested if/else, must be skipped
        op::if_cmp(Condition::IsZero, 1, None),
        op::if_cmp(Condition::IsNotZero, 1, None),
        op::write_imm(1, 0x0F, 1),
        op::else_cmd(),
        op::write_imm(1, 0x1F, 1),
        op::end_if(),
        op::else_cmd(),
        op::write_imm(1, 0x2F, 1),
        op::end_if(),
        op::end_spec(),
    ]);

    assert_eq!(vm.region(0).unwrap().bytes()[0], 0x2F);
}

#[test]
fn constructor_body_runs_on_construct_not_on_declaration() {
    let vm = run(&[
        op::reserve(0, 0x10, false),
        op::switch_focus(0),
        op::start_constructor(0, 0, 0),
        op::write_imm(1, 0xAA, 1),
        op::end_constructor(),
        op::write_imm(1, 0xBB, 1),
        op::construct(0, &[]),
        op::end_spec(),
    ]);

    let bytes = vm.region(0).unwrap().bytes();
    assert_eq!(&bytes[..2], &[0xBB, 0xAA]);
}

#[test]
fn constructor_arguments_swap_into_position_slots() {
    let vm = run(&[
        op::reserve(0, 0x20, false),
        op::switch_focus(0),
        op::start_struct(4),
        op::struct_elem(DataType::Uint32, 0xABAB_ABAB),
        op::end_struct(),
        op::start_struct(2),
        op::struct_elem(DataType::Uint32, 0x1234_5678),
        op::end_struct(),
        // the body writes arg positions 0 and 1
        op::start_constructor(3, 2, 0b01),
        op::write_struct(0, 1),
        op::write_struct(1, 1),
        op::end_constructor(),
        op::construct(3, &[4, 2]),
        op::end_spec(),
    ]);

    let bytes = vm.region(0).unwrap().bytes();
    assert_eq!(&bytes[..4], &[0xAB, 0xAB, 0xAB, 0xAB]);
    assert_eq!(&bytes[4..8], &[0x78, 0x56, 0x34, 0x12]);
}

#[test]
fn read_only_arguments_survive_constructor_writes() {
    let vm = run(&[
        op::start_struct(8),
        op::struct_elem(DataType::Uint32, 0x1111),
        op::end_struct(),
        op::start_constructor(0, 1, 0b1),
        op::write_param(0, 0, 0xFFFF_FFFF),
        op::end_constructor(),
        op::construct(0, &[8]),
        // observe the caller's struct after the call
        op::read_param(0, 8, 0),
        op::end_spec(),
    ]);

    assert_eq!(vm.registers()[0], 0x1111);
}

#[test]
fn mutable_arguments_keep_constructor_writes() {
    let vm = run(&[
        op::start_struct(8),
        op::struct_elem(DataType::Uint32, 0x1111),
        op::end_struct(),
        op::start_constructor(0, 1, 0),
        op::write_param(0, 0, 0x2222),
        op::end_constructor(),
        op::construct(0, &[8]),
        op::read_param(0, 8, 0),
        op::end_spec(),
    ]);

    assert_eq!(vm.registers()[0], 0x2222);
}

#[test]
fn read_only_writes_are_visible_inside_the_body() {
    let vm = run(&[
        op::reserve(0, 0x10, false),
        op::switch_focus(0),
        op::start_struct(8),
        op::struct_elem(DataType::Uint32, 0x1111),
        op::end_struct(),
        op::start_constructor(0, 1, 0b1),
        op::write_param(0, 0, 0x2222),
        op::write_struct(0, 1),
        op::end_constructor(),
        op::construct(0, &[8]),
        op::end_spec(),
    ]);

    // the isolated copy took the write, the caller's struct did not
    assert_eq!(&vm.region(0).unwrap().bytes()[..4], &[0x22, 0x22, 0, 0]);
    assert_eq!(vm.struct_element(8, 0), Some(0x1111));
}

#[test]
fn constructing_an_undeclared_constructor_fails() {
    let mut vm = Interpreter::in_memory();
    let err = vm
        .run(&program(&[op::construct(5, &[])]))
        .expect_err("undeclared constructor must fault");
    assert_eq!(err.panic_reason(), Some(PanicReason::ConstructorNotDeclared));
}

#[test]
fn end_spec_inside_a_loop_terminates_the_program() {
    let vm = run(&[
        op::reserve(0, 0x10, false),
        op::switch_focus(0),
        op::loop_cmd(0, Operand::Imm(0), Operand::Imm(10), Operand::Imm(1)),
        op::write_imm(1, 0xAA, 1),
        op::end_spec(),
        op::end_loop(),
    ]);

    assert_eq!(vm.region(0).unwrap().write_offset(), 1);
}

#[test]
fn call_stack_depth_is_bounded() {
    // 65 nested loops exceed the 64-frame stack
    let mut cmds = vec![op::reserve(0, 0x10, false), op::switch_focus(0)];
    for _ in 0..65 {
        cmds.push(op::loop_cmd(0, Operand::Imm(0), Operand::Imm(1), Operand::Imm(1)));
    }
    cmds.push(op::nop());
    for _ in 0..65 {
        cmds.push(op::end_loop());
    }
    cmds.push(op::end_spec());

    let mut vm = Interpreter::in_memory();
    let err = vm.run(&program(&cmds)).expect_err("stack must overflow");
    assert_eq!(err.panic_reason(), Some(PanicReason::StackOverflow));
}
