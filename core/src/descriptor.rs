use bitflags::bitflags;

/// Coarse instruction category, following the ARM reference grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrGroup {
    /// Data processing: moves and other non-arithmetic.
    Data,
    /// Data processing: arithmetic (including the multiply families).
    DataArith,
    /// Data processing: logical.
    DataLogic,
    /// Data processing: comparison/test (always flag-setting).
    DataCond,
    /// Branch and control transfer.
    Branch,
    /// Single register load/store.
    LoadStore,
    /// Multiple register load/store.
    LoadStoreMultiple,
    /// Status register access.
    Status,
    /// Coprocessor instructions.
    Coprocessor,
    /// Swap, breakpoint, software interrupt.
    Misc,
    /// No defined instruction at this encoding.
    Undefined,
}

/// Instruction identity within its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    // Data processing
    And,
    Eor,
    Sub,
    Rsb,
    Add,
    Adc,
    Sbc,
    Rsc,
    Tst,
    Teq,
    Cmp,
    Cmn,
    Orr,
    Mov,
    Bic,
    Mvn,
    Clz,
    // Multiply
    Mul,
    Mla,
    Umull,
    Umlal,
    Smull,
    Smlal,
    Smlabb,
    Smlatb,
    Smlabt,
    Smlatt,
    Smlawb,
    Smlawt,
    Smulwb,
    Smulwt,
    Smlalbb,
    Smlaltb,
    Smlalbt,
    Smlaltt,
    Smulbb,
    Smultb,
    Smulbt,
    Smultt,
    // Saturating arithmetic
    Qadd,
    Qsub,
    Qdadd,
    Qdsub,
    // Branch
    B,
    Bl,
    Bx,
    Blx,
    // Load/store
    Ldr,
    Str,
    Ldrb,
    Strb,
    Ldrt,
    Strt,
    Ldrbt,
    Strbt,
    Ldrh,
    Strh,
    Ldrd,
    Strd,
    Ldrsb,
    Ldrsh,
    // Load/store multiple
    Ldmda,
    Stmda,
    Ldmia,
    Stmia,
    Ldmdb,
    Stmdb,
    Ldmib,
    Stmib,
    // Status
    Mrs,
    Msr,
    // Misc
    Swp,
    Swpb,
    Bkpt,
    Swi,
    // Coprocessor
    Ldc,
    Stc,
    Cdp,
    Mcr,
    Mrc,
    // No instruction
    Undefined,
}

impl Instr {
    /// Base mnemonic (without condition or flag-setting suffix).
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Instr::And => "and",
            Instr::Eor => "eor",
            Instr::Sub => "sub",
            Instr::Rsb => "rsb",
            Instr::Add => "add",
            Instr::Adc => "adc",
            Instr::Sbc => "sbc",
            Instr::Rsc => "rsc",
            Instr::Tst => "tst",
            Instr::Teq => "teq",
            Instr::Cmp => "cmp",
            Instr::Cmn => "cmn",
            Instr::Orr => "orr",
            Instr::Mov => "mov",
            Instr::Bic => "bic",
            Instr::Mvn => "mvn",
            Instr::Clz => "clz",
            Instr::Mul => "mul",
            Instr::Mla => "mla",
            Instr::Umull => "umull",
            Instr::Umlal => "umlal",
            Instr::Smull => "smull",
            Instr::Smlal => "smlal",
            Instr::Smlabb => "smlabb",
            Instr::Smlatb => "smlatb",
            Instr::Smlabt => "smlabt",
            Instr::Smlatt => "smlatt",
            Instr::Smlawb => "smlawb",
            Instr::Smlawt => "smlawt",
            Instr::Smulwb => "smulwb",
            Instr::Smulwt => "smulwt",
            Instr::Smlalbb => "smlalbb",
            Instr::Smlaltb => "smlaltb",
            Instr::Smlalbt => "smlalbt",
            Instr::Smlaltt => "smlaltt",
            Instr::Smulbb => "smulbb",
            Instr::Smultb => "smultb",
            Instr::Smulbt => "smulbt",
            Instr::Smultt => "smultt",
            Instr::Qadd => "qadd",
            Instr::Qsub => "qsub",
            Instr::Qdadd => "qdadd",
            Instr::Qdsub => "qdsub",
            Instr::B => "b",
            Instr::Bl => "bl",
            Instr::Bx => "bx",
            Instr::Blx => "blx",
            Instr::Ldr => "ldr",
            Instr::Str => "str",
            Instr::Ldrb => "ldrb",
            Instr::Strb => "strb",
            Instr::Ldrt => "ldrt",
            Instr::Strt => "strt",
            Instr::Ldrbt => "ldrbt",
            Instr::Strbt => "strbt",
            Instr::Ldrh => "ldrh",
            Instr::Strh => "strh",
            Instr::Ldrd => "ldrd",
            Instr::Strd => "strd",
            Instr::Ldrsb => "ldrsb",
            Instr::Ldrsh => "ldrsh",
            Instr::Ldmda => "ldmda",
            Instr::Stmda => "stmda",
            Instr::Ldmia => "ldmia",
            Instr::Stmia => "stmia",
            Instr::Ldmdb => "ldmdb",
            Instr::Stmdb => "stmdb",
            Instr::Ldmib => "ldmib",
            Instr::Stmib => "stmib",
            Instr::Mrs => "mrs",
            Instr::Msr => "msr",
            Instr::Swp => "swp",
            Instr::Swpb => "swpb",
            Instr::Bkpt => "bkpt",
            Instr::Swi => "swi",
            Instr::Ldc => "ldc",
            Instr::Stc => "stc",
            Instr::Cdp => "cdp",
            Instr::Mcr => "mcr",
            Instr::Mrc => "mrc",
            Instr::Undefined => "UNDEFINED",
        }
    }
}

bitflags! {
    /// Operand addressing-mode flags for a decoded instruction class.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OperandFlags: u16 {
        /// Rotated 8-bit immediate (imm12 field).
        const IMM = 1 << 0;
        /// Register operand shifted by a 5-bit immediate.
        const REG_SHIFT_BY_IMM = 1 << 1;
        /// Register operand shifted by another register.
        const REG_SHIFT_BY_REG = 1 << 2;
        /// Load/store with immediate offset.
        const IMM_OFFSET = 1 << 3;
        /// Load/store with register offset.
        const REG_OFFSET = 1 << 4;
        /// Offset is applied before the access (P bit).
        const PRE_INDEX = 1 << 5;
        /// Offset is added, not subtracted (U bit).
        const INCR_OFFSET = 1 << 6;
        /// Base register is updated (W bit).
        const WRITE_BACK = 1 << 7;
        /// Instruction updates the APSR condition flags (S bit).
        const SET_FLAGS = 1 << 8;
    }
}

/// Handler capability tag carried by a descriptor.
///
/// The engine maps each tag to a handler function through a
/// replaceable dispatch table, so an embedding policy can substitute
/// its own handler for any tag without rebuilding the static tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// No emission; continue.
    None,
    /// Copy the instruction word into the code cache verbatim.
    Copy,
    /// Log a warning, then copy.
    Warn,
    /// Direct branch (B): ends the unit.
    Branch,
    /// Branch and link (BL / immediate BLX): LR setup, then branch.
    BranchLink,
    /// Register-indirect branch (BX / register BLX).
    BranchReg,
    /// Software interrupt: close the unit at the syscall boundary.
    SyscallGuard,
    /// Untranslatable encoding; fatal.
    Fail,
}

/// Static description of one decoded instruction class.
///
/// Descriptors are immutable and shared: they live in the const opcode
/// tables and are only ever borrowed by the decoder and the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeDescriptor {
    pub group: InstrGroup,
    pub instr: Instr,
    pub operand_flags: OperandFlags,
    pub action: Action,
    /// Display name, for the disassembler and diagnostics.
    pub mnemonic: &'static str,
}

impl OpcodeDescriptor {
    /// Descriptor for an undefined encoding. Routes to `Fail`, never
    /// to `Copy`.
    pub const UNDEFINED: OpcodeDescriptor = OpcodeDescriptor {
        group: InstrGroup::Undefined,
        instr: Instr::Undefined,
        operand_flags: OperandFlags::empty(),
        action: Action::Fail,
        mnemonic: "UNDEFINED",
    };

    pub const fn new(
        group: InstrGroup,
        instr: Instr,
        operand_flags: OperandFlags,
        action: Action,
    ) -> Self {
        OpcodeDescriptor {
            group,
            instr,
            operand_flags,
            action,
            mnemonic: instr.mnemonic(),
        }
    }

    #[inline]
    pub fn is_undefined(&self) -> bool {
        self.group == InstrGroup::Undefined
    }

    #[inline]
    pub fn sets_flags(&self) -> bool {
        self.operand_flags.contains(OperandFlags::SET_FLAGS)
    }
}
