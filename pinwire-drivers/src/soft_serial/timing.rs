//! Baud rate calibration
//!
//! Each supported CPU clock has a table of hand-tuned delays, one row per
//! baud rate. The delays are in ticks of the calibrated delay loop (see
//! [`pinwire_hal::timing::CYCLES_PER_TICK`]) and already absorb the
//! instruction overhead around each wait, which is why they run a little
//! short of the ideal `f_cpu / baud / CYCLES_PER_TICK`.

use pinwire_hal::timing::CYCLES_PER_TICK;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::SerialError;

/// Supported CPU clock frequencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClockFrequency {
    /// 8 MHz
    Mhz8,
    /// 16 MHz
    #[default]
    Mhz16,
    /// 20 MHz
    Mhz20,
}

impl ClockFrequency {
    /// All supported clocks
    pub const ALL: [ClockFrequency; 3] = [Self::Mhz8, Self::Mhz16, Self::Mhz20];

    /// Clock frequency in Hz
    pub const fn hz(self) -> u32 {
        match self {
            Self::Mhz8 => 8_000_000,
            Self::Mhz16 => 16_000_000,
            Self::Mhz20 => 20_000_000,
        }
    }

    /// Extra ticks added to the start bit to cover the call overhead
    /// before the first edge
    pub const fn start_adjustment(self) -> u16 {
        match self {
            Self::Mhz8 => 4,
            Self::Mhz16 => 5,
            Self::Mhz20 => 6,
        }
    }

    /// Calibration table for this clock
    pub const fn table(self) -> &'static [BaudTimingProfile] {
        match self {
            Self::Mhz8 => &TABLE_8MHZ,
            Self::Mhz16 => &TABLE_16MHZ,
            Self::Mhz20 => &TABLE_20MHZ,
        }
    }
}

/// Delays for one baud rate, in delay-loop ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaudTimingProfile {
    /// Baud rate this row is tuned for (0 when unconfigured)
    pub baud: u32,
    /// Start edge to middle of the start bit
    pub rx_centering: u16,
    /// Between consecutive data bit samples
    pub rx_intra_bit: u16,
    /// Last data bit to the end of the stop bit
    pub rx_stop_bit: u16,
    /// Duration of each transmitted bit
    pub tx_delay: u16,
}

const fn row(
    baud: u32,
    rx_centering: u16,
    rx_intra_bit: u16,
    rx_stop_bit: u16,
    tx_delay: u16,
) -> BaudTimingProfile {
    BaudTimingProfile {
        baud,
        rx_centering,
        rx_intra_bit,
        rx_stop_bit,
        tx_delay,
    }
}

#[rustfmt::skip]
static TABLE_16MHZ: [BaudTimingProfile; 13] = [
    //   baud    rxcenter  rxintra  rxstop  tx
    row(115_200,     1,       17,     17,     12),
    row( 57_600,    10,       37,     37,     33),
    row( 38_400,    25,       57,     57,     54),
    row( 31_250,    31,       70,     70,     68),
    row( 28_800,    34,       77,     77,     74),
    row( 19_200,    54,      117,    117,    114),
    row( 14_400,    74,      156,    156,    153),
    row(  9_600,   114,      236,    236,    233),
    row(  4_800,   233,      474,    474,    471),
    row(  2_400,   471,      950,    950,    947),
    row(  1_200,   947,     1902,   1902,   1899),
    row(    600,  1902,     3804,   3804,   3800),
    row(    300,  3804,     7617,   7617,   7614),
];

#[rustfmt::skip]
static TABLE_8MHZ: [BaudTimingProfile; 13] = [
    //   baud    rxcenter  rxintra  rxstop  tx
    row(115_200,     1,        5,      5,      3),
    row( 57_600,     1,       15,     15,     13),
    row( 38_400,     2,       25,     26,     23),
    row( 31_250,     7,       32,     33,     29),
    row( 28_800,    11,       35,     35,     32),
    row( 19_200,    20,       55,     55,     52),
    row( 14_400,    30,       75,     75,     72),
    row(  9_600,    50,      114,    114,    112),
    row(  4_800,   110,      233,    233,    230),
    row(  2_400,   229,      472,    472,    469),
    row(  1_200,   467,      948,    948,    945),
    row(    600,   948,     1895,   1895,   1890),
    row(    300,  1895,     3805,   3805,   3802),
];

#[rustfmt::skip]
static TABLE_20MHZ: [BaudTimingProfile; 13] = [
    //   baud    rxcenter  rxintra  rxstop  tx
    row(115_200,     3,       21,     21,     18),
    row( 57_600,    20,       43,     43,     41),
    row( 38_400,    37,       73,     73,     70),
    row( 31_250,    45,       89,     89,     88),
    row( 28_800,    46,       98,     98,     95),
    row( 19_200,    71,      148,    148,    145),
    row( 14_400,    96,      197,    197,    194),
    row(  9_600,   146,      297,    297,    294),
    row(  4_800,   296,      595,    595,    592),
    row(  2_400,   592,     1189,   1189,   1186),
    row(  1_200,  1187,     2379,   2379,   2376),
    row(    600,  2379,     4759,   4759,   4755),
    row(    300,  4759,     9523,   9523,   9520),
];

impl BaudTimingProfile {
    /// Profile of a channel that has not been (successfully) configured
    pub const UNCONFIGURED: Self = row(0, 0, 0, 0, 0);

    /// Find the calibrated profile for `baud` at `clock`
    pub fn lookup(clock: ClockFrequency, baud: u32) -> Result<Self, SerialError> {
        clock
            .table()
            .iter()
            .find(|profile| profile.baud == baud)
            .copied()
            .ok_or(SerialError::UnsupportedBaud { clock, baud })
    }

    /// Check whether this is a usable (calibrated) profile
    pub fn is_configured(&self) -> bool {
        self.baud != 0
    }
}

/// Receive checkpoints in CPU cycles, measured from the start edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SymbolTiming {
    /// One bit period
    pub symbol_cycles: u32,
    /// Start edge to the middle of the start bit
    pub centering_cycles: u32,
}

impl SymbolTiming {
    /// Derive the checkpoints for a configured profile
    ///
    /// The centering point is half a symbol, pushed out by the start bit
    /// stretch the transmitter adds, so both ends of a link built from
    /// the same tables agree on where the bit middles are.
    pub fn new(clock: ClockFrequency, profile: &BaudTimingProfile) -> Self {
        if !profile.is_configured() {
            return Self::default();
        }
        let symbol_cycles = clock.hz() / profile.baud;
        let stretch = u32::from(clock.start_adjustment()) * CYCLES_PER_TICK;
        Self {
            symbol_cycles,
            centering_cycles: symbol_cycles / 2 + stretch,
        }
    }

    /// Checkpoint at which data bit `index` (0-7) is sampled
    pub fn data_sample(&self, index: u8) -> u32 {
        self.centering_cycles + self.symbol_cycles * (u32::from(index) + 1)
    }

    /// Checkpoint at which the stop bit is sampled
    pub fn stop_sample(&self) -> u32 {
        self.data_sample(8)
    }
}
