use crate::{c32, c64};

pub trait Seal {}

impl Seal for f32 {}
impl Seal for f64 {}
impl Seal for i32 {}
impl Seal for i64 {}
impl Seal for u32 {}
impl Seal for u64 {}
impl Seal for c32 {}
impl Seal for c64 {}

impl Seal for crate::expr::inplace::Assign {}
impl Seal for crate::expr::inplace::InplacePlus {}
impl Seal for crate::expr::inplace::InplaceMinus {}
impl Seal for crate::expr::inplace::InplaceSchur {}
impl Seal for crate::expr::inplace::InplaceDiv {}

impl Seal for crate::expr::eop::kind::Neg {}
impl Seal for crate::expr::eop::kind::ScalarPlus {}
impl Seal for crate::expr::eop::kind::ScalarMinusPre {}
impl Seal for crate::expr::eop::kind::ScalarMinusPost {}
impl Seal for crate::expr::eop::kind::ScalarTimes {}
impl Seal for crate::expr::eop::kind::ScalarDivPre {}
impl Seal for crate::expr::eop::kind::ScalarDivPost {}
impl Seal for crate::expr::eop::kind::Square {}
impl Seal for crate::expr::eop::kind::Sqrt {}
impl Seal for crate::expr::eop::kind::Log {}
impl Seal for crate::expr::eop::kind::Exp {}
impl Seal for crate::expr::eop::kind::Sin {}
impl Seal for crate::expr::eop::kind::Cos {}
impl Seal for crate::expr::eop::kind::Tan {}
impl Seal for crate::expr::eop::kind::Pow {}
impl Seal for crate::expr::eop::kind::Floor {}
impl Seal for crate::expr::eop::kind::Ceil {}
impl Seal for crate::expr::eop::kind::Round {}
impl Seal for crate::expr::eop::kind::Abs {}

impl Seal for crate::expr::eglue::kind::Plus {}
impl Seal for crate::expr::eglue::kind::Minus {}
impl Seal for crate::expr::eglue::kind::Schur {}
impl Seal for crate::expr::eglue::kind::Div {}

impl Seal for crate::expr::op::kind::Transpose {}
impl Seal for crate::expr::op::kind::Inv {}
impl Seal for crate::expr::op::kind::Sum {}
impl Seal for crate::expr::op::kind::Repmat {}

impl Seal for crate::expr::glue::kind::Times {}
impl Seal for crate::expr::glue::kind::Solve {}
impl Seal for crate::expr::glue::kind::JoinCols {}
impl Seal for crate::expr::glue::kind::JoinRows {}

impl Seal for crate::cube::op::kind::Sum {}
impl Seal for crate::cube::op::kind::Mean {}

impl Seal for crate::cube::glue::kind::JoinSlices {}
