//! VPI constants used by the backend (IEEE 1364/1800 `vpi_user.h`).
#![allow(non_upper_case_globals, missing_docs)]

// Object types
pub const vpiConstant: i32 = 7;
pub const vpiIntegerVar: i32 = 25;
pub const vpiMemory: i32 = 29;
pub const vpiMemoryWord: i32 = 30;
pub const vpiModule: i32 = 32;
pub const vpiNamedBegin: i32 = 33;
pub const vpiNamedFork: i32 = 35;
pub const vpiNet: i32 = 36;
pub const vpiNetBit: i32 = 37;
pub const vpiParameter: i32 = 41;
pub const vpiRealVar: i32 = 47;
pub const vpiReg: i32 = 48;
pub const vpiRegBit: i32 = 49;
pub const vpiNetArray: i32 = 114;
pub const vpiRegArray: i32 = 116;
pub const vpiGenScopeArray: i32 = 133;
pub const vpiGenScope: i32 = 134;
pub const vpiPackage: i32 = 600;
pub const vpiInterface: i32 = 601;
pub const vpiInterfaceArray: i32 = 603;
pub const vpiLongIntVar: i32 = 610;
pub const vpiIntVar: i32 = 612;
pub const vpiStringVar: i32 = 616;
pub const vpiEnumVar: i32 = 617;
pub const vpiStructVar: i32 = 618;
pub const vpiBitVar: i32 = 620;
pub const vpiEnumNet: i32 = 680;
pub const vpiStructNet: i32 = 683;

// Relationships
pub const vpiDriver: i32 = 90;
pub const vpiInternalScope: i32 = 92;
pub const vpiLoad: i32 = 93;
pub const vpiMember: i32 = 742;
pub const vpiInstance: i32 = 745;

// Properties
pub const vpiUndefined: i32 = -1;
pub const vpiType: i32 = 1;
pub const vpiName: i32 = 2;
pub const vpiFullName: i32 = 3;
pub const vpiSize: i32 = 4;
pub const vpiDefName: i32 = 9;
pub const vpiTimePrecision: i32 = 12;
pub const vpiDefFile: i32 = 15;
pub const vpiVector: i32 = 18;
pub const vpiConstType: i32 = 40;

// Constant types
pub const vpiRealConst: i32 = 2;
pub const vpiStringConst: i32 = 6;

// `vpi_control` operations
pub const vpiStop: i32 = 66;
pub const vpiFinish: i32 = 67;

// Callback reasons
pub const cbValueChange: i32 = 1;
pub const cbReadWriteSynch: i32 = 6;
pub const cbReadOnlySynch: i32 = 7;
pub const cbNextSimTime: i32 = 8;
pub const cbAfterDelay: i32 = 9;
pub const cbStartOfSimulation: i32 = 11;
pub const cbEndOfSimulation: i32 = 12;

// `vpi_chk_error` severities
pub const vpiNotice: i32 = 1;
pub const vpiWarning: i32 = 2;
pub const vpiError: i32 = 3;
pub const vpiSystem: i32 = 4;
pub const vpiInternal: i32 = 5;

// `vpi_put_value` flags
pub const vpiNoDelay: i32 = 1;
pub const vpiInertialDelay: i32 = 2;
pub const vpiForceFlag: i32 = 5;
pub const vpiReleaseFlag: i32 = 6;
