mod mapping;
mod session_flow;
