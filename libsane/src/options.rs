use crate::{result::from_status, utils::cstr2bstr, SaneError, Scanner};
use bitflags::bitflags;
use bstr::BStr;
use libsane_sys::*;
use std::{
    ffi::{c_void, CString},
    fmt::Debug,
    ops,
    ptr::null_mut,
};

#[repr(transparent)]
#[derive(Debug, Clone)]
pub struct ScannerOptions<'b, 'd>(Vec<ScannerOption<'b, 'd>>);

#[derive(Clone)]
pub struct ScannerOption<'b, 'd> {
    scanner: &'d Scanner<'b>,

    pub number: i32,
    pub name: Option<&'d BStr>,
    pub title: &'d BStr,
    pub description: &'d BStr,
    pub ty: Type,
    pub unit: Unit,
    pub capatibilities: Capatibilities,
    pub constraint: Constraint<'d>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Bool,
    Int,
    Fixed,
    String,
    Button,
    Group,
    Unknown(SANE_Value_Type),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    None,
    Pixel,
    Bit,
    Mm,
    Dpi,
    Percent,
    Microsecond,
    Unknown(SANE_Unit),
}

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy)]
    pub struct Capatibilities: u32 {
        const SoftSelect = SANE_CAP_SOFT_SELECT;
        const HardSelect = SANE_CAP_HARD_SELECT;
        const SoftDetect = SANE_CAP_SOFT_DETECT;
        const Emulated = SANE_CAP_EMULATED;
        const Automatic = SANE_CAP_AUTOMATIC;
        const Inactive = SANE_CAP_INACTIVE;
        const Advanced = SANE_CAP_ADVANCED;

        const _ = !0;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint<'a> {
    None,
    Range {
        range: ops::RangeInclusive<i32>,
        quant: i32,
    },
    WordList(Vec<i32>),
    StringList(Vec<&'a BStr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Bool(bool),
    Int(i32),
    Fixed(f64),
    String(&'a BStr),
}

impl<'b, 'd> ScannerOptions<'b, 'd> {
    pub(crate) fn new(scanner: &'d Scanner<'b>) -> Self {
        Self(
            (0i32..i32::MAX)
                .map_while(|i| Self::get_option(scanner, i))
                .collect(),
        )
    }

    fn get_option(scanner: &'d Scanner<'b>, i: i32) -> Option<ScannerOption<'b, 'd>> {
        let handle = unsafe { scanner.get_device_handle() };

        log::trace!("Call sane_get_option_descriptor({handle:p}, {i})");
        let desc = unsafe { sane_get_option_descriptor(handle, i).as_ref() }?;

        Some(ScannerOption::new(scanner, i, desc))
    }
}

impl<'b, 'd> ops::Deref for ScannerOptions<'b, 'd> {
    type Target = [ScannerOption<'b, 'd>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'b, 'd> IntoIterator for ScannerOptions<'b, 'd> {
    type Item = <Vec<ScannerOption<'b, 'd>> as IntoIterator>::Item;
    type IntoIter = <Vec<ScannerOption<'b, 'd>> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'b, 'd> ScannerOption<'b, 'd> {
    pub fn new(scanner: &'d Scanner<'b>, i: i32, desc: &'d SANE_Option_Descriptor) -> Self {
        let empty = BStr::new("");

        Self {
            scanner,
            number: i,
            name: unsafe { cstr2bstr(desc.name) }.filter(|name| !name.is_empty()),
            title: unsafe { cstr2bstr(desc.title) }.unwrap_or(empty),
            description: unsafe { cstr2bstr(desc.desc) }.unwrap_or(empty),
            ty: desc.type_.into(),
            unit: desc.unit.into(),
            capatibilities: Capatibilities::from_bits_retain(desc.cap as u32),
            constraint: Constraint::new(desc.constraint_type, desc.constraint),
        }
    }

    pub fn is_settable(&self) -> bool {
        self.capatibilities.contains(Capatibilities::SoftSelect)
    }

    pub fn is_active(&self) -> bool {
        !self.capatibilities.contains(Capatibilities::Inactive)
    }

    pub fn is_auto_settable(&self) -> bool {
        self.capatibilities.contains(Capatibilities::Automatic)
    }

    pub fn set_value(&self, value: Value) -> Result<(), SaneError> {
        match value {
            Value::Bool(bool) => {
                let mut word: SANE_Word = bool.into();
                self.control_option(
                    SANE_Action_SANE_ACTION_SET_VALUE,
                    &mut word as *mut SANE_Word as *mut c_void,
                )
            }
            Value::Int(int) => {
                let mut word: SANE_Word = int;
                self.control_option(
                    SANE_Action_SANE_ACTION_SET_VALUE,
                    &mut word as *mut SANE_Word as *mut c_void,
                )
            }
            Value::Fixed(fixed) => {
                let mut word: SANE_Word = to_sane_fixed(fixed);
                self.control_option(
                    SANE_Action_SANE_ACTION_SET_VALUE,
                    &mut word as *mut SANE_Word as *mut c_void,
                )
            }
            Value::String(str) => {
                let str: &[u8] = str.as_ref();
                let cstr = CString::new(str).map_err(|_| SaneError::Inval)?;

                // The backend may write the accepted value back, so give it a buffer
                // as large as the option itself.
                let mut buffer = cstr.into_bytes_with_nul();
                if buffer.len() < self.size() {
                    buffer.resize(self.size(), 0);
                }

                self.control_option(
                    SANE_Action_SANE_ACTION_SET_VALUE,
                    buffer.as_mut_ptr() as *mut c_void,
                )
            }
        }
    }

    pub fn set_auto(&self) -> Result<(), SaneError> {
        self.control_option(SANE_Action_SANE_ACTION_SET_AUTO, null_mut())
    }

    fn size(&self) -> usize {
        let handle = unsafe { self.scanner.get_device_handle() };

        unsafe { sane_get_option_descriptor(handle, self.number).as_ref() }
            .and_then(|desc| usize::try_from(desc.size).ok())
            .unwrap_or(0)
    }

    fn control_option(&self, action: SANE_Action, value: *mut c_void) -> Result<(), SaneError> {
        let mut info: SANE_Int = 0;

        from_status(unsafe {
            log::trace!(
                "Call sane_control_option({:p}, {}, {}, {:p}, {:p})",
                self.scanner.get_device_handle(),
                self.number,
                action,
                value,
                &mut info,
            );

            sane_control_option(
                self.scanner.get_device_handle(),
                self.number,
                action,
                value,
                &mut info,
            )
        })?;

        if info as u32 & SANE_INFO_INEXACT != 0 {
            log::debug!("Device rounded value of option #{}", self.number);
        }

        Ok(())
    }
}

fn to_sane_fixed(value: f64) -> SANE_Word {
    (value * f64::from(1u32 << SANE_FIXED_SCALE_SHIFT)) as SANE_Word
}

impl Debug for ScannerOption<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Option")
            .field("number", &self.number)
            .field("name", &self.name)
            .field("title", &self.title)
            .field("description", &self.description)
            .field("type", &self.ty)
            .field("unit", &self.unit)
            .field("capatibilities", &self.capatibilities)
            .field("constraint", &self.constraint)
            .finish()
    }
}

impl From<SANE_Value_Type> for Type {
    fn from(ty: SANE_Value_Type) -> Self {
        match ty {
            SANE_Value_Type_SANE_TYPE_BOOL => Self::Bool,
            SANE_Value_Type_SANE_TYPE_INT => Self::Int,
            SANE_Value_Type_SANE_TYPE_FIXED => Self::Fixed,
            SANE_Value_Type_SANE_TYPE_STRING => Self::String,
            SANE_Value_Type_SANE_TYPE_BUTTON => Self::Button,
            SANE_Value_Type_SANE_TYPE_GROUP => Self::Group,
            ty => Self::Unknown(ty),
        }
    }
}

impl From<SANE_Unit> for Unit {
    fn from(unit: SANE_Unit) -> Self {
        match unit {
            SANE_Unit_SANE_UNIT_NONE => Self::None,
            SANE_Unit_SANE_UNIT_PIXEL => Self::Pixel,
            SANE_Unit_SANE_UNIT_BIT => Self::Bit,
            SANE_Unit_SANE_UNIT_MM => Self::Mm,
            SANE_Unit_SANE_UNIT_DPI => Self::Dpi,
            SANE_Unit_SANE_UNIT_PERCENT => Self::Percent,
            SANE_Unit_SANE_UNIT_MICROSECOND => Self::Microsecond,
            unit => Self::Unknown(unit),
        }
    }
}

impl<'a> Constraint<'a> {
    fn new(ty: SANE_Constraint_Type, constraint: SANE_Option_Descriptor__bindgen_ty_1) -> Self {
        match ty {
            SANE_Constraint_Type_SANE_CONSTRAINT_NONE => Self::None,
            SANE_Constraint_Type_SANE_CONSTRAINT_RANGE => {
                let range = unsafe { *constraint.range };

                Self::Range {
                    range: ops::RangeInclusive::new(range.min, range.max),
                    quant: range.quant,
                }
            }
            SANE_Constraint_Type_SANE_CONSTRAINT_WORD_LIST => {
                // First word is the length of the list.
                let list = unsafe { constraint.word_list };
                let len = unsafe { *list };

                let values = (1..=len as usize)
                    .map(|offset| unsafe { *list.add(offset) })
                    .collect();

                Self::WordList(values)
            }
            SANE_Constraint_Type_SANE_CONSTRAINT_STRING_LIST => {
                let values = (0..usize::MAX)
                    .map_while(|offset| unsafe { cstr2bstr(*constraint.string_list.add(offset)) })
                    .collect();

                Self::StringList(values)
            }
            _ => Self::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_point_conversion() {
        assert_eq!(to_sane_fixed(1.0), 0x10000);
        assert_eq!(to_sane_fixed(300.0), 300 << 16);
        assert_eq!(to_sane_fixed(0.5), 0x8000);
    }

    #[test]
    fn known_types_and_units() {
        assert_eq!(Type::from(SANE_Value_Type_SANE_TYPE_FIXED), Type::Fixed);
        assert_eq!(Unit::from(SANE_Unit_SANE_UNIT_DPI), Unit::Dpi);
    }

    #[test]
    fn unknown_types_and_units() {
        assert_eq!(Type::from(42), Type::Unknown(42));
        assert_eq!(Unit::from(42), Unit::Unknown(42));
    }

    #[test]
    fn capatibilities_ignore_unknown_bits() {
        let caps = Capatibilities::from_bits_retain(SANE_CAP_SOFT_SELECT | 1 << 20);

        assert!(caps.contains(Capatibilities::SoftSelect));
        assert!(!caps.contains(Capatibilities::Inactive));
    }
}
