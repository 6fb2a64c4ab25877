//! End-to-end programs run through the full machine.

use std::time::Duration;
use sap8::binary::{Bit, Byte};
use sap8::cpu::{ClockState, DecodeError, Edge, Event, MachineError, Pin};
use sap8::{assemble, Computer, Program};

fn load(source: &str) -> Computer {
    let program = assemble(source).unwrap();
    let mut computer = Computer::default();
    computer.load_program(&program).unwrap();
    computer
}

fn run(source: &str) -> Computer {
    let mut computer = load(source);
    computer.run_limited(Duration::ZERO, Some(1000)).unwrap();
    assert!(computer.is_halted(), "program did not halt");
    computer
}

mod instructions {
    use super::*;

    #[test]
    fn test_lda_then_hlt() {
        let mut computer = Computer::default();
        let program = Program::new(vec![Byte::from_u8(0b0000_1111), Byte::from_u8(0b1100_0000)])
            .with_data(15, Byte::parse("00000101").unwrap());
        computer.load_program(&program).unwrap();

        let cycles = computer.start(Duration::ZERO).unwrap();
        assert_eq!(computer.a().to_string(), "00000101");
        // LDA is five words; HLT stops on its third
        assert_eq!(cycles, 7);
    }

    #[test]
    fn test_ldo() {
        let computer = run("LDO X\nHLT\nX: DAT 42");
        assert_eq!(computer.output().to_u8(), 42);
        assert_eq!(computer.a().to_u8(), 0);
    }

    #[test]
    fn test_adda() {
        let computer = run("LDA X\nADDA Y\nHLT\nX: DAT 3\nY: DAT 2");
        assert_eq!(computer.a().to_u8(), 5);
        assert_eq!(computer.b().to_u8(), 2);
        assert_eq!(computer.flags().carry, Bit::Zero);
        assert_eq!(computer.flags().zero, Bit::Zero);
    }

    #[test]
    fn test_addo_leaves_a() {
        let computer = run("LDA X\nADDO Y\nHLT\nX: DAT 3\nY: DAT 2");
        assert_eq!(computer.output().to_u8(), 5);
        assert_eq!(computer.a().to_u8(), 3);
    }

    #[test]
    fn test_suba_borrow() {
        let computer = run("LDA X\nSUBA Y\nHLT\nX: DAT 2\nY: DAT 3");
        assert_eq!(computer.a().to_string(), "11111111");
        assert_eq!(computer.flags().carry, Bit::Zero);
        assert_eq!(computer.flags().zero, Bit::Zero);
    }

    #[test]
    fn test_subo() {
        let computer = run("LDA X\nSUBO Y\nHLT\nX: DAT 9\nY: DAT 4");
        assert_eq!(computer.output().to_u8(), 5);
        assert_eq!(computer.flags().carry, Bit::One);
    }

    #[test]
    fn test_stoa() {
        let computer = run("LDA X\nSTOA 15\nHLT\nX: DAT 77");
        assert_eq!(computer.datapath.memory.read(15).unwrap().to_u8(), 77);
    }

    #[test]
    fn test_stoo() {
        let computer = run("LDO X\nSTOO 14\nHLT\nX: DAT 0x5A");
        assert_eq!(computer.datapath.memory.read(14).unwrap().to_u8(), 0x5A);
    }

    #[test]
    fn test_swab() {
        // A = 5 + 2 = 7 with B = 2
        let computer = run("LDA X\nADDA Y\nSWAB\nHLT\nX: DAT 5\nY: DAT 2");
        assert_eq!(computer.a().to_u8(), 2);
        assert_eq!(computer.b().to_u8(), 7);
        assert_eq!(computer.output().to_u8(), 7);
    }

    #[test]
    fn test_swao() {
        let computer = run("LDA X\nADDA Y\nLDO Z\nSWAO\nHLT\nX: DAT 5\nY: DAT 2\nZ: DAT 9");
        assert_eq!(computer.a().to_u8(), 9);
        assert_eq!(computer.output().to_u8(), 7);
        assert_eq!(computer.b().to_u8(), 7);
    }
}

mod jumps {
    use super::*;

    #[test]
    fn test_jmpz_taken() {
        let computer = run("LDA X\nSUBA X\nJMPZ T\nHLT\nT: LDO Y\nHLT\nX: DAT 3\nY: DAT 42");
        assert_eq!(computer.output().to_u8(), 42);
        assert_eq!(computer.pc(), 6);
    }

    #[test]
    fn test_jmpz_not_taken_on_carry() {
        let computer = run("LDA X\nSUBA Y\nJMPZ T\nHLT\nT: LDO Y\nHLT\nX: DAT 3\nY: DAT 2");
        assert_eq!(computer.flags().carry, Bit::One);
        assert_eq!(computer.output().to_u8(), 0);
        assert_eq!(computer.pc(), 4);
    }

    #[test]
    fn test_jmpz_not_taken_without_flags() {
        let computer = run("JMPZ T\nHLT\nT: LDO Y\nHLT\nY: DAT 1");
        assert_eq!(computer.output().to_u8(), 0);
        assert_eq!(computer.pc(), 2);
    }

    #[test]
    fn test_jmpc_taken() {
        let computer = run("LDA X\nSUBA Y\nJMPC T\nHLT\nT: LDO Y\nHLT\nX: DAT 3\nY: DAT 2");
        assert_eq!(computer.output().to_u8(), 2);
        assert_eq!(computer.pc(), 6);
    }

    #[test]
    fn test_jmpc_not_taken_on_borrow() {
        let computer = run("LDA X\nSUBA Y\nJMPC T\nHLT\nT: LDO Y\nHLT\nX: DAT 2\nY: DAT 3");
        assert_eq!(computer.output().to_u8(), 0);
        assert_eq!(computer.pc(), 4);
    }

    #[test]
    fn test_add_overflow_sets_carry() {
        let computer = run("LDA X\nADDA Y\nJMPC T\nHLT\nT: HLT\nX: DAT 0xF0\nY: DAT 0x20");
        assert_eq!(computer.a().to_u8(), 0x10);
        assert_eq!(computer.pc(), 5);
    }

    #[test]
    fn test_zero_result_suppresses_carry() {
        // 0x80 + 0x80 carries out but is zero, so only JMPZ sees it
        let computer = run("LDA X\nADDA X\nJMPC C\nJMPZ Z\nHLT\nC: HLT\nZ: HLT\nX: DAT 0x80");
        assert_eq!(computer.flags().zero, Bit::One);
        assert_eq!(computer.flags().carry, Bit::Zero);
        assert_eq!(computer.pc(), 7);
    }

    #[test]
    fn test_countdown_loop() {
        // Subtract 1 until zero
        let source = "\
LOOP: SUBA ONE
      JMPZ DONE
      JMPC LOOP
DONE: STOA 15
      HLT
ONE:  DAT 1
";
        let mut computer = load(source);
        computer.datapath.a.load(Byte::from_u8(4));
        computer.start(Duration::ZERO).unwrap();
        assert_eq!(computer.a().to_u8(), 0);
        let retired = computer
            .drain_events()
            .iter()
            .filter(|e| matches!(e, Event::Retired { .. }))
            .count();
        // Four SUBA, four JMPZ, three JMPC, one STOA
        assert_eq!(retired, 12);
    }
}

mod clocking {
    use super::*;

    #[test]
    fn test_bus_write_seen_in_same_edge() {
        let mut computer = load("LDA X\nHLT\nX: DAT 9");
        // Rising edges 1-3 fetch and address; the fourth asserts RO AI
        for _ in 0..3 {
            computer.cycle().unwrap();
        }
        assert_eq!(computer.pulse().unwrap(), Some(Edge::Rising));
        assert!(computer.control.pin(Pin::Ro) && computer.control.pin(Pin::Ai));
        assert_eq!(computer.a().to_u8(), 9);
    }

    #[test]
    fn test_nothing_runs_after_hlt() {
        let mut computer = run("HLT\nLDA X\nX: DAT 1");
        let snapshot = computer.snapshot();
        assert_eq!(computer.pulse().unwrap(), None);
        computer.cycle().unwrap();
        computer.step_instruction().unwrap();
        assert_eq!(computer.snapshot(), snapshot);
        assert_eq!(computer.a().to_u8(), 0);
        assert_eq!(computer.start(Duration::ZERO), Err(MachineError::Halted));
    }

    #[test]
    fn test_manual_halt() {
        let mut computer = load("LDA X\nHLT\nX: DAT 1");
        computer.cycle().unwrap();
        computer.halt();
        assert_eq!(computer.clock.state(), ClockState::Halted);
        assert_eq!(computer.pulse().unwrap(), None);
    }

    #[test]
    fn test_decode_fault_halts_first() {
        let mut computer = Computer::default();
        computer
            .load_program(&Program::new(vec![Byte::from_u8(0xF0)]))
            .unwrap();
        let err = computer.start(Duration::ZERO).unwrap_err();
        assert_eq!(err, MachineError::Decode(DecodeError::UndefinedOpcode(15)));
        assert!(computer.is_halted());
        assert_eq!(computer.pulse().unwrap(), None);
    }

    #[test]
    fn test_event_log() {
        let mut computer = run("LDA X\nHLT\nX: DAT 1");
        assert_eq!(
            computer.drain_events(),
            vec![
                Event::Fetched { instruction: 0x02 },
                Event::Retired { pc: 1 },
                Event::Fetched { instruction: 0xC0 },
                Event::Halted,
            ]
        );
        assert!(computer.drain_events().is_empty());
    }

    #[test]
    fn test_compute_event() {
        let mut computer = run("LDA X\nADDA X\nHLT\nX: DAT 3");
        let computed: Vec<Event> = computer
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, Event::Computed { .. }))
            .collect();
        assert_eq!(computed, vec![Event::Computed { result: 6, carry: Bit::Zero, zero: Bit::Zero }]);
    }
}

mod memory {
    use super::*;
    use sap8::cpu::MemoryError;

    #[test]
    fn test_capacity_exceeded() {
        assert_eq!(
            Computer::new(5).unwrap_err(),
            MachineError::Memory(MemoryError::CapacityExceeded { pages: 5, max: 4 })
        );
    }

    #[test]
    fn test_small_memory_wraps_addresses() {
        // Four cells: LDA 6 reads cell 2
        let mut computer = Computer::new(2).unwrap();
        let program = Program::new(vec![Byte::from_u8(0x06), Byte::from_u8(0xC0), Byte::from_u8(9)]);
        computer.load_program(&program).unwrap();
        computer.start(Duration::ZERO).unwrap();
        assert_eq!(computer.a().to_u8(), 9);
    }

    #[test]
    fn test_program_too_large() {
        let mut computer = Computer::new(1).unwrap();
        let err = computer.load_program(&Program::new(vec![Byte::zero(); 3])).unwrap_err();
        assert_eq!(err, MachineError::Memory(MemoryError::ProgramTooLarge { size: 3, available: 2 }));
    }

    #[test]
    fn test_bus_overflow_keeps_running() {
        let mut computer = load("LDA X\nHLT\nX: DAT 1");
        let mut wide = vec![Bit::One; 4];
        wide.extend_from_slice(Byte::from_u8(0x42).bits());
        computer.datapath.write_bus(&wide, &mut computer.control);
        assert_eq!(computer.datapath.bus.read().to_u8(), 0x42);

        computer.start(Duration::ZERO).unwrap();
        assert_eq!(computer.a().to_u8(), 1);
    }
}

mod snapshot {
    use super::*;

    #[test]
    fn test_snapshot_json_shape() {
        let computer = run("LDA X\nHLT\nX: DAT 5");
        let json = serde_json::to_value(computer.snapshot()).unwrap();

        assert_eq!(json["devices"]["A"]["contents"], "00000101");
        assert_eq!(json["devices"]["A"]["mode"], "Float");
        assert_eq!(json["devices"]["PC"]["contents"], "00000010");
        assert_eq!(json["clock"]["state"], "Halted");
        assert_eq!(json["control"]["pins"], serde_json::json!(["Hlt"]));
        assert_eq!(json["memory"].as_array().unwrap().len(), 16);
    }
}
