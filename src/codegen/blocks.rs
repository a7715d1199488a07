//! Label/jump graph for targets without structured control flow.
//!
//! Each open `if` chain or loop is a [`Frame`] holding the labels of its
//! blocks. Opening, continuing and closing a construct yields a short list
//! of [`Instr`]s which the backend renders in its own syntax. Jump targets
//! for `break` and `continue` are looked up on the frame stack.

use crate::error::{CodegenError, CodegenResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    Label(String),
    Jump(String),
    /// Jump to `target` unless the bool fragment `cond` is true.
    JumpUnless { cond: String, target: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// `next` is the entry of the following `else if`/`else` block; it is
    /// `None` once the `else` block has been entered.
    Branch { end: String, next: Option<String> },
    /// `next` runs the post statement, `cond` tests the loop condition and
    /// `end` is the exit.
    Loop { next: String, cond: String, end: String },
}

#[derive(Debug, Default)]
pub struct BlockGraph {
    frames: Vec<Frame>,
    labels: usize,
}

impl BlockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A label name unique within one run.
    pub fn fresh(&mut self, stem: &str) -> String {
        self.labels += 1;
        format!("__sb_{}_{}", stem, self.labels)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn open_branch(&mut self, cond: &str) -> Vec<Instr> {
        let next = self.fresh("else");
        let end = self.fresh("endif");
        self.frames.push(Frame::Branch {
            end,
            next: Some(next.clone()),
        });
        vec![Instr::JumpUnless {
            cond: cond.to_string(),
            target: next,
        }]
    }

    pub fn else_if(&mut self, cond: &str) -> CodegenResult<Vec<Instr>> {
        let fresh = self.fresh("else");
        let (end, next) = self.branch_mut()?;
        let prev = next.replace(fresh.clone()).ok_or(CodegenError::Unbalanced {
            construct: "else if after else",
        })?;
        Ok(vec![
            Instr::Jump(end.clone()),
            Instr::Label(prev),
            Instr::JumpUnless {
                cond: cond.to_string(),
                target: fresh,
            },
        ])
    }

    pub fn else_branch(&mut self) -> CodegenResult<Vec<Instr>> {
        let (end, next) = self.branch_mut()?;
        let prev = next.take().ok_or(CodegenError::Unbalanced {
            construct: "else after else",
        })?;
        Ok(vec![Instr::Jump(end.clone()), Instr::Label(prev)])
    }

    pub fn close_branch(&mut self) -> CodegenResult<Vec<Instr>> {
        match self.frames.pop() {
            Some(Frame::Branch { end, next }) => {
                let mut out = Vec::with_capacity(2);
                if let Some(next) = next {
                    out.push(Instr::Label(next));
                }
                out.push(Instr::Label(end));
                Ok(out)
            }
            _ => Err(CodegenError::Unbalanced { construct: "if" }),
        }
    }

    /// The first pass jumps straight to the condition so the post
    /// statement is skipped.
    pub fn open_loop(&mut self) -> Vec<Instr> {
        let next = self.fresh("next");
        let cond = self.fresh("cond");
        let end = self.fresh("done");
        self.frames.push(Frame::Loop {
            next: next.clone(),
            cond: cond.clone(),
            end,
        });
        vec![Instr::Jump(cond), Instr::Label(next)]
    }

    pub fn loop_condition_label(&self) -> CodegenResult<Vec<Instr>> {
        match self.frames.last() {
            Some(Frame::Loop { cond, .. }) => Ok(vec![Instr::Label(cond.clone())]),
            _ => Err(CodegenError::Unbalanced { construct: "for" }),
        }
    }

    pub fn loop_exit_unless(&self, cond: &str) -> CodegenResult<Vec<Instr>> {
        match self.frames.last() {
            Some(Frame::Loop { end, .. }) => Ok(vec![Instr::JumpUnless {
                cond: cond.to_string(),
                target: end.clone(),
            }]),
            _ => Err(CodegenError::Unbalanced { construct: "for" }),
        }
    }

    pub fn close_loop(&mut self) -> CodegenResult<Vec<Instr>> {
        match self.frames.pop() {
            Some(Frame::Loop { next, end, .. }) => Ok(vec![Instr::Jump(next), Instr::Label(end)]),
            _ => Err(CodegenError::Unbalanced { construct: "for" }),
        }
    }

    pub fn break_target(&self) -> CodegenResult<Instr> {
        self.innermost_loop("break")
            .map(|(_, end)| Instr::Jump(end.to_string()))
    }

    pub fn continue_target(&self) -> CodegenResult<Instr> {
        self.innermost_loop("continue")
            .map(|(next, _)| Instr::Jump(next.to_string()))
    }

    fn innermost_loop(&self, keyword: &'static str) -> CodegenResult<(&str, &str)> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| match f {
                Frame::Loop { next, end, .. } => Some((next.as_str(), end.as_str())),
                Frame::Branch { .. } => None,
            })
            .ok_or(CodegenError::OutsideLoop { keyword })
    }

    fn branch_mut(&mut self) -> CodegenResult<(&String, &mut Option<String>)> {
        match self.frames.last_mut() {
            Some(Frame::Branch { end, next }) => Ok((&*end, next)),
            _ => Err(CodegenError::Unbalanced { construct: "if" }),
        }
    }
}
