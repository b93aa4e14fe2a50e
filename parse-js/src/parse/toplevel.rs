use super::ParseCtx;
use super::Parser;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::token::TT;
use crate::Program;

impl<'a> Parser<'a> {
  pub fn parse_program(&mut self) -> SyntaxResult<Program> {
    let ctx = ParseCtx {
      strict: self.env().strict,
      allow_in: true,
    };
    let (body, strict) = self.parse_directive_body(ctx, &[])?;
    let t = self.peek();
    if t.typ != TT::EOF {
      return Err(t.error(SyntaxErrorType::UnexpectedToken));
    }
    Ok(Program { body, strict })
  }
}
