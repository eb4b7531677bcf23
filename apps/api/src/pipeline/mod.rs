// Shared pipeline core: typed run state, the node executor and the retry wrapper.
// Graph 1 lives in `extraction`, Graph 2 in `evaluation`.

pub mod node;
pub mod state;
