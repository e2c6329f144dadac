/// 命令相对于前一条命令退出状态的门控操作符
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum GateOp {
    /// 行首命令，无前置操作符
    None,
    /// `;`
    Seq,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl GateOp {
    /// 根据上一条命令的退出状态判断当前命令是否执行
    pub fn allows(self, last_status: i32) -> bool {
        match self {
            GateOp::And => last_status == 0,
            GateOp::Or => last_status != 0,
            GateOp::None | GateOp::Seq => true,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Command {
    /// 参数列表，第一项是程序名或内建命令名；解析保证非空
    pub argv: Vec<String>,
    pub background: bool,
    pub gate: GateOp,
}
