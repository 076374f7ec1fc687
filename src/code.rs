use once_cell::sync::Lazy;
use std::collections::HashMap;

use anyhow::{anyhow, Result};
use byteorder::{BigEndian, ByteOrder};
use std::convert::TryFrom;
use std::fmt::{Debug, Display, Formatter};
use std::iter::FromIterator;
use std::ops::{Index, IndexMut};

#[derive(Clone, PartialEq, Eq)]
pub struct Instructions(Vec<u8>);
impl Instructions {
    pub fn new() -> Self {
        Self(vec![])
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, u8> {
        self.0.iter()
    }
    pub fn rest(&self, i: usize) -> &[u8] {
        &self.0[i..]
    }
    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }
}

impl Default for Instructions {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<usize> for Instructions {
    type Output = u8;
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}
impl IndexMut<usize> for Instructions {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}
impl IntoIterator for Instructions {
    type Item = u8;
    type IntoIter = std::vec::IntoIter<Self::Item>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
impl FromIterator<u8> for Instructions {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut instruction = Instructions::new();
        for b in iter {
            instruction.0.push(b);
        }
        instruction
    }
}
impl Extend<u8> for Instructions {
    fn extend<I: IntoIterator<Item = u8>>(&mut self, iter: I) {
        for b in iter {
            self.0.push(b);
        }
    }
}
impl Debug for Instructions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
impl Display for Instructions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn fmt_instruction(def: &Definition, operands: &[usize]) -> String {
            let operand_count = def.operand_widths.len();
            if operands.len() != operand_count {
                return format!(
                    "ERROR: operand len {} does not match defined {}",
                    operands.len(),
                    operand_count
                );
            }
            match operand_count {
                0 => format!("{}", def.name),
                1 => format!("{} {}", def.name, operands[0]),
                2 => format!("{} {} {}", def.name, operands[0], operands[1]),
                _ => format!("ERROR: unhandled operand_count for {}\n", def.name),
            }
        }
        let mut i = 0;
        while i < self.len() {
            match lookup(self.0[i]) {
                Ok(def) => {
                    let (operands, read) = read_operands(def, self.rest(i + 1));
                    write!(f, "{:04} {}\n", i, fmt_instruction(def, &operands))?;
                    i += 1 + read;
                }
                Err(err) => return write!(f, "ERROR: {:?}\n", err),
            }
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Opcode {
    OpConstant,
    OpAdd,
    OpPop,
    OpSub,
    OpMul,
    OpDiv,
    OpTrue,
    OpFalse,
    OpEqual,
    OpNotEqual,
    OpGreaterThan,
    OpMinus,
    OpBang,
    OpJumpNotTruthy,
    OpJump,
    OpNull,
    OpSetGlobal,
    OpGetGlobal,
    OpArray,
    OpHash,
    OpIndex,
    OpCall,
    OpReturnValue,
    OpReturn,
    OpSetLocal,
    OpGetLocal,
    OpGetBuiltin,
    OpClosure,
    OpGetFree,
    OpCurrentClosure,
}

impl TryFrom<u8> for Opcode {
    type Error = &'static str;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use Opcode::*;
        match value {
            0 => Ok(OpConstant),
            1 => Ok(OpAdd),
            2 => Ok(OpPop),
            3 => Ok(OpSub),
            4 => Ok(OpMul),
            5 => Ok(OpDiv),
            6 => Ok(OpTrue),
            7 => Ok(OpFalse),
            8 => Ok(OpEqual),
            9 => Ok(OpNotEqual),
            10 => Ok(OpGreaterThan),
            11 => Ok(OpMinus),
            12 => Ok(OpBang),
            13 => Ok(OpJumpNotTruthy),
            14 => Ok(OpJump),
            15 => Ok(OpNull),
            16 => Ok(OpSetGlobal),
            17 => Ok(OpGetGlobal),
            18 => Ok(OpArray),
            19 => Ok(OpHash),
            20 => Ok(OpIndex),
            21 => Ok(OpCall),
            22 => Ok(OpReturnValue),
            23 => Ok(OpReturn),
            24 => Ok(OpSetLocal),
            25 => Ok(OpGetLocal),
            26 => Ok(OpGetBuiltin),
            27 => Ok(OpClosure),
            28 => Ok(OpGetFree),
            29 => Ok(OpCurrentClosure),
            _ => Err("not found opcode"),
        }
    }
}

pub struct Definition {
    name: &'static str,
    operand_widths: Vec<usize>,
}

static DEFINITIONS: Lazy<HashMap<u8, Definition>> = Lazy::new(|| {
    use Opcode::*;
    let defs = vec![
        (OpConstant, "OpConstant", vec![2]),
        (OpAdd, "OpAdd", vec![]),
        (OpPop, "OpPop", vec![]),
        (OpSub, "OpSub", vec![]),
        (OpMul, "OpMul", vec![]),
        (OpDiv, "OpDiv", vec![]),
        (OpTrue, "OpTrue", vec![]),
        (OpFalse, "OpFalse", vec![]),
        (OpEqual, "OpEqual", vec![]),
        (OpNotEqual, "OpNotEqual", vec![]),
        (OpGreaterThan, "OpGreaterThan", vec![]),
        (OpMinus, "OpMinus", vec![]),
        (OpBang, "OpBang", vec![]),
        (OpJumpNotTruthy, "OpJumpNotTruthy", vec![2]),
        (OpJump, "OpJump", vec![2]),
        (OpNull, "OpNull", vec![]),
        (OpSetGlobal, "OpSetGlobal", vec![2]),
        (OpGetGlobal, "OpGetGlobal", vec![2]),
        (OpArray, "OpArray", vec![2]),
        (OpHash, "OpHash", vec![2]),
        (OpIndex, "OpIndex", vec![]),
        (OpCall, "OpCall", vec![1]),
        (OpReturnValue, "OpReturnValue", vec![]),
        (OpReturn, "OpReturn", vec![]),
        (OpSetLocal, "OpSetLocal", vec![1]),
        (OpGetLocal, "OpGetLocal", vec![1]),
        (OpGetBuiltin, "OpGetBuiltin", vec![1]),
        (OpClosure, "OpClosure", vec![2, 1]),
        (OpGetFree, "OpGetFree", vec![1]),
        (OpCurrentClosure, "OpCurrentClosure", vec![]),
    ];
    let mut map = HashMap::new();
    for (op, name, operand_widths) in defs {
        map.insert(
            op as u8,
            Definition {
                name,
                operand_widths,
            },
        );
    }
    map
});

pub fn lookup<'a>(op: u8) -> Result<&'a Definition> {
    DEFINITIONS
        .get(&op)
        .ok_or_else(|| anyhow!("opcode {} is undefined", op))
}

pub fn make(op: Opcode, operands: &[usize]) -> Instructions {
    let def = DEFINITIONS.get(&(op as u8));
    if def.is_none() {
        return Instructions(vec![]);
    }
    let def = def.unwrap();
    // opcode (1 byte) + operands (? byte)
    let instruction_len = 1 + def.operand_widths.iter().sum::<usize>();
    let mut instruction = vec![0u8; instruction_len];
    instruction[0] = op as u8;
    let mut offset = 1;
    for (i, &operand) in operands.iter().enumerate() {
        let width = def.operand_widths[i];
        match width {
            2 => {
                BigEndian::write_u16(&mut instruction[offset..], operand as u16);
            }
            1 => {
                instruction[offset] = operand as u8;
            }
            _ => unreachable!(),
        }
        offset += width;
    }
    Instructions(instruction)
}

pub fn read_operands(def: &Definition, instructions: &[u8]) -> (Vec<usize>, usize) {
    let mut operands = vec![0; def.operand_widths.len()];
    let mut offset = 0;
    for (i, width) in def.operand_widths.iter().enumerate() {
        match width {
            2 => {
                operands[i] = read_uint16(&instructions[offset..]) as usize;
            }
            1 => {
                operands[i] = read_uint8(&instructions[offset..]) as usize;
            }
            _ => unreachable!(),
        }
        offset += width;
    }
    (operands, offset)
}

pub fn read_uint16(instructions: &[u8]) -> u16 {
    BigEndian::read_u16(instructions)
}

pub fn read_uint8(instructions: &[u8]) -> u8 {
    instructions[0]
}
