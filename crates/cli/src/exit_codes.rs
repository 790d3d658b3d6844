//! CLI Exit Code Registry
//!
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                           |
//! |------|---------------------------------------------------|
//! | 0    | Success                                           |
//! | 1    | General error                                     |
//! | 2    | Usage error (bad args, reported by clap)          |
//! | 3    | I/O error reading or writing a file               |
//! | 4    | Sheet config could not be parsed or built         |
//! | 5    | Data, request or state file is not the expected JSON |
//! | 6    | Sheet error (missing row key, bad column index)   |
//! | 7    | `apply --strict`: the request had bad updates     |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

pub const EXIT_IO: u8 = 3;

pub const EXIT_CONFIG: u8 = 4;

pub const EXIT_DATA: u8 = 5;

/// Fatal engine error during decode, validate or commit.
pub const EXIT_SHEET: u8 = 6;

/// Validation failed and `--strict` was given.
pub const EXIT_BAD_UPDATES: u8 = 7;
