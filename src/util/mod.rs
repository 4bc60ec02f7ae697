pub(crate) mod str_utils;
pub(crate) mod utf16;
