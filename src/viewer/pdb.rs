//! PDB 坐标记录解析（仅 ATOM / HETATM，供 HeadlessEngine 使用）

use thiserror::Error;

/// 水分子残基名
const WATER_RESIDUES: &[&str] = &["HOH", "WAT", "DOD", "H2O"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PdbError {
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("No ATOM/HETATM records found")]
    Empty,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PdbParseErrorKind {
    #[error("Line is too short for ATOM/HETATM record (must be at least 54 chars)")]
    LineTooShort,
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
}

/// 单个原子记录
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub name: String,
    pub residue_name: String,
    pub residue_number: i32,
    pub chain_id: String,
    pub element: String,
    pub position: [f64; 3],
    pub hetero: bool,
}

impl AtomRecord {
    pub fn is_water(&self) -> bool {
        WATER_RESIDUES.contains(&self.residue_name.as_str())
    }

    pub fn is_ligand(&self) -> bool {
        self.hetero && !self.is_water()
    }
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}

/// 元素列（77-78）缺失时，按原子名首个字母推断
fn infer_element(atom_name: &str) -> String {
    atom_name
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase().to_string())
        .unwrap_or_default()
}

/// 解析 PDB 文本中的 ATOM / HETATM 行；其它记录忽略。遇到 ENDMDL 时停止（只取第一个模型）
pub fn parse_pdb(text: &str) -> Result<Vec<AtomRecord>, PdbError> {
    let mut atoms = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_num = idx + 1;
        let record = slice_and_trim(line, 0, 6);
        let hetero = match record {
            "ATOM" => false,
            "HETATM" => true,
            "ENDMDL" => break,
            _ => continue,
        };

        if line.len() < 54 {
            return Err(PdbError::Parse {
                line: line_num,
                kind: PdbParseErrorKind::LineTooShort,
            });
        }

        let name = slice_and_trim(line, 12, 16).to_string();
        let residue_name = slice_and_trim(line, 17, 20).to_string();
        let chain_id = slice_and_trim(line, 21, 22).to_string();
        let res_seq = slice_and_trim(line, 22, 26);
        let residue_number = res_seq.parse::<i32>().map_err(|_| PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::InvalidInt {
                columns: "23-26".into(),
                value: res_seq.to_string(),
            },
        })?;
        let x = parse_float(line, line_num, 30, 38)?;
        let y = parse_float(line, line_num, 38, 46)?;
        let z = parse_float(line, line_num, 46, 54)?;

        let element = match slice_and_trim(line, 76, 78) {
            "" => infer_element(&name),
            e => e.to_string(),
        };

        atoms.push(AtomRecord {
            name,
            residue_name,
            residue_number,
            chain_id: if chain_id.is_empty() { "A".to_string() } else { chain_id },
            element,
            position: [x, y, z],
            hetero,
        });
    }

    if atoms.is_empty() {
        return Err(PdbError::Empty);
    }
    Ok(atoms)
}
