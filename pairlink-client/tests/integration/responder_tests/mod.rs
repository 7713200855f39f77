mod test_pending_candidates_flushed_in_order;
