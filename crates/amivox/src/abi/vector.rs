use std::fmt;

/// The system functions a narrator guest calls through its library bases,
/// identified by the 16-bit displacement of `jsr d16(A6)`.
///
/// The exec.library vectors are negative offsets from the exec base; the
/// final entry is the BeginIO vector of the audio/narrator device the
/// guest itself installs via MakeLibrary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecVector {
    MakeLibrary,
    AllocMem,
    FreeMem,
    AllocSignal,
    FreeSignal,
    FindTask,
    AddTask,
    SetTaskPri,
    AddDevice,
    OpenDevice,
    PutMsg,
    ReplyMsg,
    GetMsg,
    Wait,
    Signal,
    DoIo,
    WaitIo,
    DeviceBeginIo,
}

impl ExecVector {
    /// Map a `jsr d16(A6)` displacement (as an unsigned word) to its
    /// function. Unknown displacements are the caller's problem to
    /// report.
    pub fn from_offset(offset: u16) -> Option<ExecVector> {
        match offset {
            0xFFAC => Some(ExecVector::MakeLibrary),
            0xFF3A => Some(ExecVector::AllocMem),
            0xFF2E => Some(ExecVector::FreeMem),
            0xFEB6 => Some(ExecVector::AllocSignal),
            0xFEB0 => Some(ExecVector::FreeSignal),
            0xFEDA => Some(ExecVector::FindTask),
            0xFEE6 => Some(ExecVector::AddTask),
            0xFED4 => Some(ExecVector::SetTaskPri),
            0xFE50 => Some(ExecVector::AddDevice),
            0xFE44 => Some(ExecVector::OpenDevice),
            0xFE92 => Some(ExecVector::PutMsg),
            0xFE86 => Some(ExecVector::ReplyMsg),
            0xFE8C => Some(ExecVector::GetMsg),
            0xFEC2 => Some(ExecVector::Wait),
            0xFEBC => Some(ExecVector::Signal),
            0xFE38 => Some(ExecVector::DoIo),
            0xFE26 => Some(ExecVector::WaitIo),
            0xFFE2 => Some(ExecVector::DeviceBeginIo),
            _ => None,
        }
    }

    pub fn offset(self) -> u16 {
        match self {
            ExecVector::MakeLibrary => 0xFFAC,
            ExecVector::AllocMem => 0xFF3A,
            ExecVector::FreeMem => 0xFF2E,
            ExecVector::AllocSignal => 0xFEB6,
            ExecVector::FreeSignal => 0xFEB0,
            ExecVector::FindTask => 0xFEDA,
            ExecVector::AddTask => 0xFEE6,
            ExecVector::SetTaskPri => 0xFED4,
            ExecVector::AddDevice => 0xFE50,
            ExecVector::OpenDevice => 0xFE44,
            ExecVector::PutMsg => 0xFE92,
            ExecVector::ReplyMsg => 0xFE86,
            ExecVector::GetMsg => 0xFE8C,
            ExecVector::Wait => 0xFEC2,
            ExecVector::Signal => 0xFEBC,
            ExecVector::DoIo => 0xFE38,
            ExecVector::WaitIo => 0xFE26,
            ExecVector::DeviceBeginIo => 0xFFE2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ExecVector::MakeLibrary => "MakeLibrary",
            ExecVector::AllocMem => "AllocMem",
            ExecVector::FreeMem => "FreeMem",
            ExecVector::AllocSignal => "AllocSignal",
            ExecVector::FreeSignal => "FreeSignal",
            ExecVector::FindTask => "FindTask",
            ExecVector::AddTask => "AddTask",
            ExecVector::SetTaskPri => "SetTaskPri",
            ExecVector::AddDevice => "AddDevice",
            ExecVector::OpenDevice => "OpenDevice",
            ExecVector::PutMsg => "PutMsg",
            ExecVector::ReplyMsg => "ReplyMsg",
            ExecVector::GetMsg => "GetMsg",
            ExecVector::Wait => "Wait",
            ExecVector::Signal => "Signal",
            ExecVector::DoIo => "DoIO",
            ExecVector::WaitIo => "WaitIO",
            ExecVector::DeviceBeginIo => "BeginIO",
        }
    }

    #[cfg(test)]
    const ALL: [ExecVector; 18] = [
        ExecVector::MakeLibrary,
        ExecVector::AllocMem,
        ExecVector::FreeMem,
        ExecVector::AllocSignal,
        ExecVector::FreeSignal,
        ExecVector::FindTask,
        ExecVector::AddTask,
        ExecVector::SetTaskPri,
        ExecVector::AddDevice,
        ExecVector::OpenDevice,
        ExecVector::PutMsg,
        ExecVector::ReplyMsg,
        ExecVector::GetMsg,
        ExecVector::Wait,
        ExecVector::Signal,
        ExecVector::DoIo,
        ExecVector::WaitIo,
        ExecVector::DeviceBeginIo,
    ];
}

impl fmt::Display for ExecVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shown as the function name plus its negative LVO, the way
        // exec call sites read: "AllocMem (-$c6)".
        let lvo = (self.offset() as i16).unsigned_abs();
        write!(f, "{} (-${:x})", self.name(), lvo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_round_trip() {
        for v in ExecVector::ALL {
            assert_eq!(ExecVector::from_offset(v.offset()), Some(v));
        }
    }

    #[test]
    fn unknown_offsets_map_to_none() {
        assert_eq!(ExecVector::from_offset(0x0000), None);
        assert_eq!(ExecVector::from_offset(0xFFFE), None);
        assert_eq!(ExecVector::from_offset(0xFE00), None);
    }

    #[test]
    fn display_names_the_lvo() {
        assert_eq!(ExecVector::AllocMem.to_string(), "AllocMem (-$c6)");
        assert_eq!(ExecVector::DeviceBeginIo.to_string(), "BeginIO (-$1e)");
    }
}
