//! Pipeline plumbing: the four inter-stage latches and the hazard logic
//! (stall detection and operand forwarding).

/// Data hazard detection and forwarding.
pub mod hazards;

/// Double-buffered inter-stage latches (F/D, D/X, X/M, M/W).
pub mod latches;
