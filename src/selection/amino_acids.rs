//! 氨基酸元数据静态表（仅用于丰富选区描述，不做化学计算）

use std::fmt;

/// 侧链类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideChainClass {
    NonpolarAliphatic,
    Aromatic,
    PolarUncharged,
    PositivelyCharged,
    NegativelyCharged,
}

impl SideChainClass {
    pub fn describe(&self) -> &'static str {
        match self {
            SideChainClass::NonpolarAliphatic => "nonpolar, aliphatic",
            SideChainClass::Aromatic => "aromatic",
            SideChainClass::PolarUncharged => "polar, uncharged",
            SideChainClass::PositivelyCharged => "positively charged (basic)",
            SideChainClass::NegativelyCharged => "negatively charged (acidic)",
        }
    }
}

impl fmt::Display for SideChainClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AminoAcid {
    pub code: &'static str,
    pub letter: char,
    pub name: &'static str,
    pub class: SideChainClass,
}

const fn aa(code: &'static str, letter: char, name: &'static str, class: SideChainClass) -> AminoAcid {
    AminoAcid {
        code,
        letter,
        name,
        class,
    }
}

use SideChainClass::*;

pub static AMINO_ACIDS: [AminoAcid; 20] = [
    aa("ALA", 'A', "Alanine", NonpolarAliphatic),
    aa("GLY", 'G', "Glycine", NonpolarAliphatic),
    aa("ILE", 'I', "Isoleucine", NonpolarAliphatic),
    aa("LEU", 'L', "Leucine", NonpolarAliphatic),
    aa("PRO", 'P', "Proline", NonpolarAliphatic),
    aa("VAL", 'V', "Valine", NonpolarAliphatic),
    aa("PHE", 'F', "Phenylalanine", Aromatic),
    aa("TRP", 'W', "Tryptophan", Aromatic),
    aa("TYR", 'Y', "Tyrosine", Aromatic),
    aa("ASN", 'N', "Asparagine", PolarUncharged),
    aa("CYS", 'C', "Cysteine", PolarUncharged),
    aa("GLN", 'Q', "Glutamine", PolarUncharged),
    aa("SER", 'S', "Serine", PolarUncharged),
    aa("THR", 'T', "Threonine", PolarUncharged),
    aa("MET", 'M', "Methionine", PolarUncharged),
    aa("ARG", 'R', "Arginine", PositivelyCharged),
    aa("LYS", 'K', "Lysine", PositivelyCharged),
    aa("HIS", 'H', "Histidine", PositivelyCharged),
    aa("ASP", 'D', "Aspartic acid", NegativelyCharged),
    aa("GLU", 'E', "Glutamic acid", NegativelyCharged),
];

/// 质子化状态变体等别名 -> 标准三字母码
const ALIASES: &[(&str, &str)] = &[
    ("HSE", "HIS"),
    ("HSD", "HIS"),
    ("HSP", "HIS"),
    ("HIE", "HIS"),
    ("HID", "HIS"),
    ("HIP", "HIS"),
    ("CYX", "CYS"),
    ("MSE", "MET"),
];

/// 按三字母码查找（大小写不敏感，支持常见别名）
pub fn lookup(code: &str) -> Option<&'static AminoAcid> {
    let upper = code.trim().to_ascii_uppercase();
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == upper)
        .map(|(_, c)| *c)
        .unwrap_or(upper.as_str());
    AMINO_ACIDS.iter().find(|a| a.code == canonical)
}
