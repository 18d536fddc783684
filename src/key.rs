//! Description of the generic key type [`AddressKey`], and of the tagged key [`Key`].

use std::cmp::Ordering;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

#[cfg(feature = "cidr")]
use cidr::{Ipv4Cidr, Ipv6Cidr};
#[cfg(feature = "ipnet")]
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
#[cfg(feature = "ipnetwork")]
use ipnetwork::{Ipv4Network, Ipv6Network};
use num_traits::{CheckedShl, CheckedShr, PrimInt, Unsigned, Zero};

/// Trait for keys stored in an address trie.
///
/// A key is a fixed-width bit string (an address), optionally carrying a prefix length that turns
/// it into a contiguous block of addresses. Keys are ordered by the lower bound of their block,
/// and if the lower bounds are equal, the larger block comes first (see [`AddressKey::key_cmp`]).
pub trait AddressKey: Sized + Clone {
    /// How the bits are represented. This must be one of `u8`, `u16`, `u32`, `u64`, or `u128`.
    type R: Unsigned + PrimInt + Zero + CheckedShr + CheckedShl;

    /// Raw address bits, aligned to the most significant bit of `Self::R`. Bits after the prefix
    /// length may be set; they are ignored by every comparison.
    fn bits(&self) -> Self::R;

    /// Number of bits in the address (32 for IPv4, 48 for a MAC address, ...). This may be smaller
    /// than the width of `Self::R`.
    fn bit_count(&self) -> u8;

    /// Prefix length of a block, or `None` if the key is a single address.
    fn prefix_len(&self) -> Option<u8>;

    /// Create a key from its (left-aligned) bits, the bit count and the prefix length.
    fn from_parts(bits: Self::R, bit_count: u8, prefix_len: Option<u8>) -> Self;

    /// Number of leading bits that are fixed in this key. For a single address, this is the bit
    /// count.
    fn block_len(&self) -> u8 {
        match self.prefix_len() {
            Some(len) => len.min(self.bit_count()),
            None => self.bit_count(),
        }
    }

    /// mask `self.bits()` using `self.block_len()`. If you can guarantee that `bits` is already
    /// masked, then simply re-implement this function for your type.
    fn mask(&self) -> Self::R {
        self.bits() & mask_from_prefix_len(self.block_len())
    }

    /// Create the block that contains every address of the given bit count.
    fn root(bit_count: u8) -> Self {
        Self::from_parts(Self::R::zero(), bit_count, Some(0))
    }

    /// longest common prefix
    fn longest_common_prefix(&self, other: &Self) -> Self {
        let a = self.mask();
        let b = other.mask();
        let len = ((a ^ b).leading_zeros() as u8)
            .min(self.block_len())
            .min(other.block_len());
        let bits = a & mask_from_prefix_len(len);
        Self::from_parts(bits, self.bit_count(), Some(len))
    }

    /// Check if `self` contains `other` in its block. This function also returns `true` if `self`
    /// is identical to `other`.
    fn contains(&self, other: &Self) -> bool {
        if self.block_len() > other.block_len() {
            return false;
        }
        other.bits() & mask_from_prefix_len(self.block_len()) == self.mask()
    }

    /// Check if a specific bit is set (counted from the left, where 0 is the first bit from the
    /// left). Bits after the block length are never set.
    fn bit_at(&self, bit: u8) -> bool {
        let mask = (!Self::R::zero())
            .checked_shr(bit as u32)
            .unwrap_or_else(Self::R::zero)
            ^ (!Self::R::zero())
                .checked_shr(1u32 + bit as u32)
                .unwrap_or_else(Self::R::zero);
        mask & self.mask() != Self::R::zero()
    }

    /// Whether both keys describe the same block. A single address and the block of that address
    /// with a full prefix length are the same.
    fn key_eq(&self, other: &Self) -> bool {
        self.mask() == other.mask() && self.block_len() == other.block_len()
    }

    /// Compare two keys: first by the lower bound of their block, and then the larger block
    /// (shorter prefix) first.
    fn key_cmp(&self, other: &Self) -> Ordering {
        self.mask()
            .cmp(&other.mask())
            .then_with(|| self.block_len().cmp(&other.block_len()))
    }
}

pub(crate) fn mask_from_prefix_len<R>(len: u8) -> R
where
    R: PrimInt + Zero,
{
    if len as u32 >= R::zero().count_zeros() {
        !R::zero()
    } else if len == 0 {
        R::zero()
    } else {
        !((!R::zero()) >> len as usize)
    }
}

fn repr_bits<R: PrimInt>() -> u32 {
    R::zero().count_zeros()
}

/// A fixed-width bit string, stored right-aligned in `R`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Bits<R> {
    value: R,
    width: u8,
}

impl<R> Bits<R>
where
    R: PrimInt + CheckedShr + CheckedShl,
{
    /// Create a bit string of `width` bits. Bits of `value` above `width` are dropped.
    ///
    /// Panics if `width` exceeds the number of bits of `R`.
    pub fn new(value: R, width: u8) -> Self {
        let total = repr_bits::<R>();
        assert!(
            width as u32 <= total,
            "a bit string of width {width} does not fit into {total} bits"
        );
        let low_mask = (!R::zero())
            .checked_shr(total - width as u32)
            .unwrap_or_else(R::zero);
        Self {
            value: value & low_mask,
            width,
        }
    }

    /// The numeric value of the bit string.
    pub fn value(&self) -> R {
        self.value
    }

    /// Number of bits.
    pub fn width(&self) -> u8 {
        self.width
    }

    fn aligned(&self) -> R {
        self.value
            .checked_shl(repr_bits::<R>() - self.width as u32)
            .unwrap_or_else(R::zero)
    }

    fn from_aligned(bits: R, width: u8) -> Self {
        let value = bits
            .checked_shr(repr_bits::<R>() - width as u32)
            .unwrap_or_else(R::zero);
        Self { value, width }
    }
}

/// A key that is either a single address, or a block of addresses sharing a prefix.
///
/// MAC addresses (or any other fixed-width identifier) can be stored as `Key<u64>` with the
/// appropriate width:
///
/// ```
/// # use address_trie::*;
/// let mac = Key::exact(0x00_1b_21_3a_4f_5e_u64, 48);
/// let oui = Key::block(0x00_1b_21_00_00_00_u64, 48, 24);
/// assert!(oui.contains(&mac));
/// assert_eq!(mac.bit_count(), 48);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Key<R> {
    /// A single address.
    Exact(Bits<R>),
    /// All addresses whose first `len` bits match.
    Block(Bits<R>, u8),
}

impl<R> Key<R>
where
    R: Unsigned + PrimInt + CheckedShr + CheckedShl,
{
    /// A single address of `width` bits.
    pub fn exact(value: R, width: u8) -> Self {
        Self::Exact(Bits::new(value, width))
    }

    /// The block of addresses of `width` bits whose first `len` bits match `value`. The stored
    /// address is the lower bound of the block.
    ///
    /// Panics if `len` exceeds `width`.
    pub fn block(value: R, width: u8, len: u8) -> Self {
        assert!(len <= width, "prefix length {len} exceeds the width {width}");
        let aligned = Bits::new(value, width).aligned() & mask_from_prefix_len(len);
        Self::Block(Bits::from_aligned(aligned, width), len)
    }

    /// The address (or the lower bound of the block).
    pub fn address(&self) -> &Bits<R> {
        match self {
            Key::Exact(bits) | Key::Block(bits, _) => bits,
        }
    }

    /// Whether this key is a block rather than a single address.
    pub fn is_block(&self) -> bool {
        matches!(self, Key::Block(..))
    }
}

impl<R> AddressKey for Key<R>
where
    R: Unsigned + PrimInt + Zero + CheckedShr + CheckedShl,
{
    type R = R;

    fn bits(&self) -> R {
        self.address().aligned()
    }

    fn bit_count(&self) -> u8 {
        self.address().width
    }

    fn prefix_len(&self) -> Option<u8> {
        match self {
            Key::Exact(_) => None,
            Key::Block(_, len) => Some(*len),
        }
    }

    fn from_parts(bits: R, bit_count: u8, prefix_len: Option<u8>) -> Self {
        match prefix_len {
            None => Key::Exact(Bits::from_aligned(bits, bit_count)),
            Some(len) => Key::Block(
                Bits::from_aligned(bits & mask_from_prefix_len(len), bit_count),
                len,
            ),
        }
    }
}

impl From<Ipv4Addr> for Key<u32> {
    fn from(addr: Ipv4Addr) -> Self {
        Key::exact(addr.into(), 32)
    }
}

impl From<Ipv6Addr> for Key<u128> {
    fn from(addr: Ipv6Addr) -> Self {
        Key::exact(addr.into(), 128)
    }
}

impl From<IpAddr> for Key<u128> {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(a) => Key::exact(u32::from(a) as u128, 32),
            IpAddr::V6(a) => Key::exact(a.into(), 128),
        }
    }
}

#[cfg(feature = "ipnet")]
impl From<Ipv4Net> for Key<u32> {
    fn from(net: Ipv4Net) -> Self {
        Key::block(net.network().into(), 32, net.prefix_len())
    }
}

#[cfg(feature = "ipnet")]
impl From<Ipv6Net> for Key<u128> {
    fn from(net: Ipv6Net) -> Self {
        Key::block(net.network().into(), 128, net.prefix_len())
    }
}

#[cfg(feature = "ipnet")]
impl From<IpNet> for Key<u128> {
    fn from(net: IpNet) -> Self {
        match net {
            IpNet::V4(n) => Key::block(u32::from(n.network()) as u128, 32, n.prefix_len()),
            IpNet::V6(n) => Key::from(n),
        }
    }
}

#[cfg(feature = "ipnet")]
impl AddressKey for Ipv4Net {
    type R = u32;

    fn bits(&self) -> u32 {
        self.addr().into()
    }

    fn bit_count(&self) -> u8 {
        32
    }

    fn prefix_len(&self) -> Option<u8> {
        Some(self.prefix_len())
    }

    fn from_parts(bits: u32, _bit_count: u8, prefix_len: Option<u8>) -> Self {
        Ipv4Net::new(bits.into(), prefix_len.unwrap_or(32)).expect("prefix length is at most 32")
    }

    fn mask(&self) -> u32 {
        self.network().into()
    }

    fn root(_bit_count: u8) -> Self {
        Default::default()
    }
}

#[cfg(feature = "ipnet")]
impl AddressKey for Ipv6Net {
    type R = u128;

    fn bits(&self) -> u128 {
        self.addr().into()
    }

    fn bit_count(&self) -> u8 {
        128
    }

    fn prefix_len(&self) -> Option<u8> {
        Some(self.prefix_len())
    }

    fn from_parts(bits: u128, _bit_count: u8, prefix_len: Option<u8>) -> Self {
        Ipv6Net::new(bits.into(), prefix_len.unwrap_or(128))
            .expect("prefix length is at most 128")
    }

    fn mask(&self) -> u128 {
        self.network().into()
    }

    fn root(_bit_count: u8) -> Self {
        Default::default()
    }
}

/// Both families in one key type. IPv4 blocks are stored in the upper 32 bits, and their bit count
/// is 32, so an `AddressTrie<IpNet>` holds either IPv4 or IPv6 blocks, never both.
#[cfg(feature = "ipnet")]
impl AddressKey for IpNet {
    type R = u128;

    fn bits(&self) -> u128 {
        match self {
            IpNet::V4(n) => (u32::from(n.addr()) as u128) << 96,
            IpNet::V6(n) => n.addr().into(),
        }
    }

    fn bit_count(&self) -> u8 {
        match self {
            IpNet::V4(_) => 32,
            IpNet::V6(_) => 128,
        }
    }

    fn prefix_len(&self) -> Option<u8> {
        Some(IpNet::prefix_len(self))
    }

    fn from_parts(bits: u128, bit_count: u8, prefix_len: Option<u8>) -> Self {
        if bit_count == 128 {
            IpNet::V6(<Ipv6Net as AddressKey>::from_parts(bits, 128, prefix_len))
        } else {
            let v4 = (bits >> 96) as u32;
            IpNet::V4(<Ipv4Net as AddressKey>::from_parts(v4, 32, prefix_len))
        }
    }
}

#[cfg(feature = "ipnetwork")]
impl AddressKey for Ipv4Network {
    type R = u32;

    fn bits(&self) -> u32 {
        self.ip().into()
    }

    fn bit_count(&self) -> u8 {
        32
    }

    fn prefix_len(&self) -> Option<u8> {
        Some(self.prefix())
    }

    fn from_parts(bits: u32, _bit_count: u8, prefix_len: Option<u8>) -> Self {
        Ipv4Network::new(bits.into(), prefix_len.unwrap_or(32))
            .expect("prefix length is at most 32")
    }

    fn mask(&self) -> u32 {
        self.network().into()
    }
}

#[cfg(feature = "ipnetwork")]
impl AddressKey for Ipv6Network {
    type R = u128;

    fn bits(&self) -> u128 {
        self.ip().into()
    }

    fn bit_count(&self) -> u8 {
        128
    }

    fn prefix_len(&self) -> Option<u8> {
        Some(self.prefix())
    }

    fn from_parts(bits: u128, _bit_count: u8, prefix_len: Option<u8>) -> Self {
        Ipv6Network::new(bits.into(), prefix_len.unwrap_or(128))
            .expect("prefix length is at most 128")
    }

    fn mask(&self) -> u128 {
        self.network().into()
    }
}

#[cfg(feature = "cidr")]
impl AddressKey for Ipv4Cidr {
    type R = u32;

    fn bits(&self) -> u32 {
        self.first_address().into()
    }

    fn bit_count(&self) -> u8 {
        32
    }

    fn prefix_len(&self) -> Option<u8> {
        Some(self.network_length())
    }

    fn from_parts(bits: u32, _bit_count: u8, prefix_len: Option<u8>) -> Self {
        let len = prefix_len.unwrap_or(32);
        let bits = bits & mask_from_prefix_len::<u32>(len);
        Ipv4Cidr::new(bits.into(), len).expect("host bits are masked")
    }

    fn mask(&self) -> u32 {
        self.first_address().into()
    }
}

#[cfg(feature = "cidr")]
impl AddressKey for Ipv6Cidr {
    type R = u128;

    fn bits(&self) -> u128 {
        self.first_address().into()
    }

    fn bit_count(&self) -> u8 {
        128
    }

    fn prefix_len(&self) -> Option<u8> {
        Some(self.network_length())
    }

    fn from_parts(bits: u128, _bit_count: u8, prefix_len: Option<u8>) -> Self {
        let len = prefix_len.unwrap_or(128);
        let bits = bits & mask_from_prefix_len::<u128>(len);
        Ipv6Cidr::new(bits.into(), len).expect("host bits are masked")
    }

    fn mask(&self) -> u128 {
        self.first_address().into()
    }
}

impl<R> AddressKey for (R, u8)
where
    R: Unsigned + PrimInt + Zero + CheckedShr + CheckedShl,
{
    type R = R;

    fn bits(&self) -> R {
        self.0
    }

    fn bit_count(&self) -> u8 {
        repr_bits::<R>() as u8
    }

    fn prefix_len(&self) -> Option<u8> {
        Some(self.1)
    }

    fn from_parts(bits: R, _bit_count: u8, prefix_len: Option<u8>) -> Self {
        (bits, prefix_len.unwrap_or(repr_bits::<R>() as u8))
    }
}
