// 音频处理模块
//
// 子模块：
// - separator: 人声分离编排（暂存输入、调用引擎、分类输出、读回内存）
// - classify: 输出文件名到轨道类型的分类

pub mod classify;
pub mod separator;
