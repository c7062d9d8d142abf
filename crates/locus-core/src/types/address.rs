//! Memory address type and the process-wide address width.

use std::fmt;

use once_cell::sync::OnceCell;

/// Strongly typed absolute address
///
/// This wrapper around `u64` keeps absolute (runtime) addresses apart from
/// offsets, sizes and file-relative addresses, which are plain `u64`/`i64`
/// values throughout the crate.
///
/// ## Example
///
/// ```rust
/// use locus_core::types::Address;
///
/// let addr = Address::from(0x1000);
/// assert_eq!(addr.checked_offset(0x10), Some(Address::from(0x1010)));
/// assert_eq!(addr.checked_offset(-0x10), Some(Address::from(0xff0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// Create a new address from a `u64` value
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Apply a signed offset, returning `None` on overflow or underflow
    pub fn checked_offset(self, offset: i64) -> Option<Self>
    {
        self.0.checked_add_signed(offset).map(Address)
    }

    /// Render with a `0x` prefix, zero-padded to `width` hex digits
    ///
    /// ```rust
    /// use locus_core::types::Address;
    ///
    /// assert_eq!(Address::from(0x1010).padded(8), "0x00001010");
    /// ```
    #[must_use]
    pub fn padded(self, width: usize) -> String
    {
        format!("0x{:0width$x}", self.0)
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// ELF class of a module: the width of its addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressClass
{
    /// 32-bit image
    Elf32,
    /// 64-bit image
    Elf64,
}

impl AddressClass
{
    /// Number of hex digits needed to print a full address of this class.
    pub const fn hex_width(self) -> usize
    {
        match self {
            AddressClass::Elf32 => 8,
            AddressClass::Elf64 => 16,
        }
    }
}

static ADDRESS_WIDTH: OnceCell<usize> = OnceCell::new();

/// Hex width used when printing addresses.
///
/// The width is taken from the class of the first module it is asked about
/// and then reused for the rest of the process, whatever module is passed
/// later. With no module on the first call it settles on 16.
pub fn address_width(class: Option<AddressClass>) -> usize
{
    *ADDRESS_WIDTH.get_or_init(|| class.map_or(16, AddressClass::hex_width))
}
