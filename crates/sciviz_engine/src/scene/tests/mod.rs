//! Frame-cycle scenarios across models, managers and the world
