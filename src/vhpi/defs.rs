//! VHPI constants used by the backend (IEEE 1076 `vhpi_user.h`).
#![allow(non_upper_case_globals, missing_docs)]

// Class kinds
pub const vhpiArrayTypeDeclK: i32 = 1002;
pub const vhpiBlockStmtK: i32 = 1013;
pub const vhpiCompInstStmtK: i32 = 1018;
pub const vhpiConstDeclK: i32 = 1026;
pub const vhpiEnumTypeDeclK: i32 = 1045;
pub const vhpiFloatTypeDeclK: i32 = 1051;
pub const vhpiForGenerateK: i32 = 1053;
pub const vhpiGenericDeclK: i32 = 1060;
pub const vhpiIfGenerateK: i32 = 1065;
pub const vhpiIndexedNameK: i32 = 1067;
pub const vhpiIntTypeDeclK: i32 = 1070;
pub const vhpiPackInstK: i32 = 1080;
pub const vhpiPhysTypeDeclK: i32 = 1085;
pub const vhpiPortDeclK: i32 = 1087;
pub const vhpiRecordTypeDeclK: i32 = 1092;
pub const vhpiRootInstK: i32 = 1095;
pub const vhpiSelectedNameK: i32 = 1096;
pub const vhpiSigDeclK: i32 = 1097;
pub const vhpiVarDeclK: i32 = 1115;

// One-to-one relationships
pub const vhpiBaseType: i32 = 1303;
pub const vhpiElemType: i32 = 1310;
pub const vhpiRootInst: i32 = 1348;

// One-to-many relationships
pub const vhpiConstDecls: i32 = 1505;
pub const vhpiDrivers: i32 = 1511;
pub const vhpiGenericDecls: i32 = 1517;
pub const vhpiIndexedNames: i32 = 1521;
pub const vhpiInternalRegions: i32 = 1523;
pub const vhpiPackInsts: i32 = 1528;
pub const vhpiPortDecls: i32 = 1532;
pub const vhpiSelectedNames: i32 = 1536;
pub const vhpiSigDecls: i32 = 1537;

// Integer properties
pub const vhpiUndefined: i32 = -1;
pub const vhpiKindP: i32 = 1021;
pub const vhpiNumDimensionsP: i32 = 1027;
pub const vhpiSizeP: i32 = 1046;
pub const vhpiResolutionLimitP: i32 = 1056;

// String properties
pub const vhpiCaseNameP: i32 = 1302;
pub const vhpiDefNameP: i32 = 1304;
pub const vhpiFileNameP: i32 = 1305;
pub const vhpiKindStrP: i32 = 1309;
pub const vhpiNameP: i32 = 1311;

// `vhpi_control` commands
pub const vhpiStop: i32 = 0;
pub const vhpiFinish: i32 = 1;

// Callback reasons
pub const vhpiCbValueChange: i32 = 1001;
pub const vhpiCbAfterDelay: i32 = 1011;
pub const vhpiCbEndOfProcesses: i32 = 1016;
pub const vhpiCbNextTimeStep: i32 = 1019;
pub const vhpiCbLastKnownDeltaCycle: i32 = 1020;
pub const vhpiCbStartOfSimulation: i32 = 1031;
pub const vhpiCbEndOfSimulation: i32 = 1032;

// `vhpi_check_error` severities
pub const vhpiNote: i32 = 1;
pub const vhpiWarning: i32 = 2;
pub const vhpiError: i32 = 3;
pub const vhpiSystem: i32 = 4;
pub const vhpiInternal: i32 = 5;
pub const vhpiFailure: i32 = 6;

// `vhpi_put_value` modes
pub const vhpiDeposit: i32 = 1;
pub const vhpiDepositPropagate: i32 = 2;
pub const vhpiForce: i32 = 3;
pub const vhpiForcePropagate: i32 = 4;
pub const vhpiRelease: i32 = 5;
