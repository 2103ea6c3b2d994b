fn main() {
    statement_ledger::run()
}
