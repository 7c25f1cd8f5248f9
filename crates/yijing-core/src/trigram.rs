//! The eight trigrams and the King Wen lookup from trigram pairs to
//! hexagram numbers.
//!
//! Trigram encodings are written bottom line first, `1` for yang and `0` for
//! yin, so `"100"` is Zhen (one yang line under two yin lines).

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

use crate::{Error, Result, hexagram::LineKind};

// ─── Trigram ─────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum Trigram {
  Qian,
  Zhen,
  Kan,
  Gen,
  Kun,
  Xun,
  Li,
  Dui,
}

impl Trigram {
  /// Bottom-to-top line kinds.
  pub fn lines(self) -> [LineKind; 3] {
    use LineKind::{Yang as T, Yin as F};
    match self {
      Self::Qian => [T, T, T],
      Self::Zhen => [T, F, F],
      Self::Kan => [F, T, F],
      Self::Gen => [F, F, T],
      Self::Kun => [F, F, F],
      Self::Xun => [F, T, T],
      Self::Li => [T, F, T],
      Self::Dui => [T, T, F],
    }
  }

  pub fn from_lines(lines: [LineKind; 3]) -> Self {
    Self::iter()
      .find(|t| t.lines() == lines)
      .unwrap_or(Self::Kun)
  }

  /// The `"101"`-style encoding used on the wire.
  pub fn bits(self) -> String {
    self
      .lines()
      .iter()
      .map(|k| if k.is_yang() { '1' } else { '0' })
      .collect()
  }

  pub fn from_bits(bits: &str) -> Result<Self> {
    let kinds: Vec<LineKind> = bits
      .chars()
      .map(|c| match c {
        '1' => Ok(LineKind::Yang),
        '0' => Ok(LineKind::Yin),
        _ => Err(Error::UnknownTrigram(bits.to_owned())),
      })
      .collect::<Result<_>>()?;
    let lines: [LineKind; 3] = kinds
      .try_into()
      .map_err(|_| Error::UnknownTrigram(bits.to_owned()))?;
    Ok(Self::from_lines(lines))
  }

  pub fn chinese_name(self) -> &'static str {
    match self {
      Self::Qian => "乾",
      Self::Zhen => "震",
      Self::Kan => "坎",
      Self::Gen => "艮",
      Self::Kun => "坤",
      Self::Xun => "巽",
      Self::Li => "离",
      Self::Dui => "兑",
    }
  }

  pub fn symbol(self) -> char {
    match self {
      Self::Qian => '☰',
      Self::Dui => '☱',
      Self::Li => '☲',
      Self::Zhen => '☳',
      Self::Xun => '☴',
      Self::Kan => '☵',
      Self::Gen => '☶',
      Self::Kun => '☷',
    }
  }

  fn table_index(self) -> usize { self as usize }
}

impl fmt::Display for Trigram {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.symbol(), self.chinese_name())
  }
}

// ─── King Wen lookup ─────────────────────────────────────────────────────────

/// Rows are the upper trigram, columns the lower, both in [`Trigram`]
/// declaration order.
const KING_WEN: [[u8; 8]; 8] = [
  //  Qian Zhen Kan Gen Kun Xun  Li Dui
  [1, 25, 6, 33, 12, 44, 13, 10],  // Qian
  [34, 51, 40, 62, 16, 32, 55, 54], // Zhen
  [5, 3, 29, 39, 8, 48, 63, 60],    // Kan
  [26, 27, 4, 52, 23, 18, 22, 41],  // Gen
  [11, 24, 7, 15, 2, 46, 36, 19],   // Kun
  [9, 42, 59, 53, 20, 57, 37, 61],  // Xun
  [14, 21, 64, 56, 35, 50, 30, 38], // Li
  [43, 17, 47, 31, 45, 28, 49, 58], // Dui
];

/// `(chinese, pinyin)` indexed by King Wen number minus one.
const NAMES: [(&str, &str); 64] = [
  ("乾", "Qian"),
  ("坤", "Kun"),
  ("屯", "Zhun"),
  ("蒙", "Meng"),
  ("需", "Xu"),
  ("讼", "Song"),
  ("师", "Shi"),
  ("比", "Bi"),
  ("小畜", "Xiao Chu"),
  ("履", "Lü"),
  ("泰", "Tai"),
  ("否", "Pi"),
  ("同人", "Tong Ren"),
  ("大有", "Da You"),
  ("谦", "Qian"),
  ("豫", "Yu"),
  ("随", "Sui"),
  ("蛊", "Gu"),
  ("临", "Lin"),
  ("观", "Guan"),
  ("噬嗑", "Shi He"),
  ("贲", "Bi"),
  ("剥", "Bo"),
  ("复", "Fu"),
  ("无妄", "Wu Wang"),
  ("大畜", "Da Chu"),
  ("颐", "Yi"),
  ("大过", "Da Guo"),
  ("坎", "Kan"),
  ("离", "Li"),
  ("咸", "Xian"),
  ("恒", "Heng"),
  ("遁", "Dun"),
  ("大壮", "Da Zhuang"),
  ("晋", "Jin"),
  ("明夷", "Ming Yi"),
  ("家人", "Jia Ren"),
  ("睽", "Kui"),
  ("蹇", "Jian"),
  ("解", "Xie"),
  ("损", "Sun"),
  ("益", "Yi"),
  ("夬", "Guai"),
  ("姤", "Gou"),
  ("萃", "Cui"),
  ("升", "Sheng"),
  ("困", "Kun"),
  ("井", "Jing"),
  ("革", "Ge"),
  ("鼎", "Ding"),
  ("震", "Zhen"),
  ("艮", "Gen"),
  ("渐", "Jian"),
  ("归妹", "Gui Mei"),
  ("丰", "Feng"),
  ("旅", "Lü"),
  ("巽", "Xun"),
  ("兑", "Dui"),
  ("涣", "Huan"),
  ("节", "Jie"),
  ("中孚", "Zhong Fu"),
  ("小过", "Xiao Guo"),
  ("既济", "Ji Ji"),
  ("未济", "Wei Ji"),
];

/// King Wen sequence number (1..=64) of `upper` over `lower`.
pub fn king_wen_number(upper: Trigram, lower: Trigram) -> u8 {
  KING_WEN[upper.table_index()][lower.table_index()]
}

/// Identity of a hexagram in the King Wen sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KingWen {
  pub number:       u8,
  pub chinese_name: &'static str,
  pub pinyin:       &'static str,
  pub upper:        Trigram,
  pub lower:        Trigram,
}

impl KingWen {
  pub fn lookup(upper: Trigram, lower: Trigram) -> Self {
    let number = king_wen_number(upper, lower);
    let (chinese_name, pinyin) = NAMES[usize::from(number - 1)];
    Self { number, chinese_name, pinyin, upper, lower }
  }

  /// The Unicode hexagram symbol; the block is laid out in King Wen order.
  pub fn symbol(&self) -> char {
    char::from_u32(0x4DC0 + u32::from(self.number) - 1).unwrap_or('䷀')
  }
}
