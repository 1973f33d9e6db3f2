pub mod ctrl;
pub mod net;
pub mod predict;
pub mod sim;
pub mod topo;

#[cfg(test)]
mod test;
