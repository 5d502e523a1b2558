use chip8_engine::{
    Chip8Error, Chip8State, CompatibilityMode, Key, MachineStatus, Opcode, PC_START_ADDR,
    Register, StepOutcome,
};

fn assemble(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_be_bytes()).collect()
}

/// Steps until the machine halts, failing the test after `limit` steps.
fn run_to_halt(state: &mut Chip8State, limit: usize) -> usize {
    for steps in 0..limit {
        if !state.step().unwrap().should_continue() {
            return steps;
        }
    }
    panic!("program did not halt within {limit} steps");
}

#[test]
fn counts_down_in_a_loop() {
    let program = assemble(&[
        0x600A, // V0 = 10
        0x6100, // V1 = 0
        0x7101, // loop: V1 += 1
        0x70FF, // V0 -= 1
        0x3000, // skip if V0 == 0
        0x1204, // jump loop
    ]);
    let mut state = Chip8State::new();
    state.load_program(&program);

    run_to_halt(&mut state, 100);
    assert_eq!(state.register(Register::V0), 0);
    assert_eq!(state.register(Register::V1), 10);
    assert_eq!(state.status(), MachineStatus::Halted);
    assert_eq!(usize::from(state.pc()), usize::from(PC_START_ADDR) + program.len());
}

#[test]
fn subroutine_prints_a_digit_in_bcd() {
    let program = assemble(&[
        0x6A7B, // VA = 123
        0xA300, // I = 0x300
        0x2208, // call print
        0x1218, // jump to end
        // print: 0x208
        0xFA33, // BCD VA
        0xF265, // V0..=V2 = digits
        0xF029, // I = glyph(V0)
        0xD015, // draw at (V0, V1)
        0x00EE,
        0x0000,
        0x0000,
        0x0000,
        // end: 0x218
        0x0000,
    ]);
    let mut state = Chip8State::new();
    state.load_program(&program);

    run_to_halt(&mut state, 100);
    assert_eq!(state.register(Register::V0), 1);
    assert_eq!(state.register(Register::V1), 2);
    assert_eq!(state.register(Register::V2), 3);
    assert_eq!(state.pc(), 0x218);
    assert!(state.stack().is_empty());
    // Glyph "1" drawn at (1, 2) has eight lit pixels.
    assert_eq!(state.framebuffer().lit_count(), 8);
    assert!(state.pixel(3, 2));
}

#[test]
fn waits_for_a_key_then_resumes() {
    let program = assemble(&[
        0xF50A, // V5 = key
        0xE59E, // skip if V5 pressed
        0x6600, // V6 = 0
        0x6601, // V6 = 1
    ]);
    let mut state = Chip8State::new();
    state.load_program(&program);

    state.step().unwrap();
    for _ in 0..10 {
        assert_eq!(state.step().unwrap(), StepOutcome::AwaitingKey(Register::V5));
    }
    state.clock_timers();

    state.trigger_key_down(Key::Key9);
    assert_eq!(
        state.step().unwrap(),
        StepOutcome::Executed(Opcode::SkipIfKeyPressed)
    );
    state.step().unwrap();
    assert_eq!(state.register(Register::V5), 9);
    assert_eq!(state.register(Register::V6), 1);
}

#[test]
fn delay_timer_is_clocked_independently() {
    let program = assemble(&[
        0x6003, // V0 = 3
        0xF015, // DT = V0
        0xF107, // loop: V1 = DT
        0x3100, // skip if V1 == 0
        0x1204, // jump loop
    ]);
    let mut state = Chip8State::new();
    state.load_program(&program);

    let mut clocks = 0;
    for _ in 0..200 {
        if !state.step().unwrap().should_continue() {
            break;
        }
        if state.delay_timer() > 0 && state.pc() == 0x204 {
            state.clock_timers();
            clocks += 1;
        }
    }
    assert_eq!(state.status(), MachineStatus::Halted);
    assert_eq!(clocks, 3);
}

#[test]
fn drawing_twice_erases_with_collision() {
    let program = assemble(&[
        0xA000, // I = glyph 0
        0x6008, // V0 = 8
        0xD005, // draw
        0x6F07, // VF = 7
        0xD005, // draw again
    ]);
    let mut state = Chip8State::new();
    state.load_program(&program);

    for _ in 0..3 {
        state.step().unwrap();
    }
    assert_eq!(state.register(Register::VF), 0);
    assert!(state.framebuffer().lit_count() > 0);

    for _ in 0..2 {
        state.step().unwrap();
    }
    assert_eq!(state.register(Register::VF), 1);
    assert_eq!(state.framebuffer().lit_count(), 0);
}

#[test]
fn compatibility_mode_can_change_mid_program() {
    let program = assemble(&[
        0x6106, // V1 = 6
        0x6208, // V2 = 8
        0x8126, // V1 >>= 1 (mode dependent)
        0x8126,
    ]);
    let mut state = Chip8State::new();
    state.load_program(&program);

    for _ in 0..3 {
        state.step().unwrap();
    }
    assert_eq!(state.register(Register::V1), 3);

    state.set_compatibility_mode(CompatibilityMode::Chip8);
    state.step().unwrap();
    assert_eq!(state.register(Register::V1), 4);
    assert_eq!(state.register(Register::V2), 8);
}

#[test]
fn loads_program_from_file() {
    let path = std::env::temp_dir().join(format!("chip8-engine-{}.ch8", std::process::id()));
    std::fs::write(&path, assemble(&[0x6042, 0x0000])).unwrap();

    let mut state = Chip8State::new();
    state.set_compatibility_mode(CompatibilityMode::Chip8);
    let loaded = state.load_program_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded, 4);
    assert_eq!(state.compatibility_mode(), CompatibilityMode::SuperChip);
    run_to_halt(&mut state, 10);
    assert_eq!(state.register(Register::V0), 0x42);
}

#[test]
fn stack_underflow_is_reported_and_repeatable() {
    let mut state = Chip8State::new();
    state.load_program(&assemble(&[0x00EE]));

    for _ in 0..2 {
        assert!(matches!(state.step(), Err(Chip8Error::StackUnderflow)));
        assert_eq!(state.pc(), PC_START_ADDR);
    }
}
