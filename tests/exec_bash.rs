mod common;
use common::*;

#[test]
fn exec_var_addition() {
    assert_stdout("var a = 2\nvar b = 3\nprint(a + b)\n", "5\n");
}

#[test]
fn exec_bool_prints_as_digit() {
    assert_stdout("print(2 == 2)\nprint(1 > 2)\nprint(true && !false)\n", "1\n0\n1\n");
}

#[test]
fn exec_counted_loop() {
    assert_stdout("for a := 0; a < 2; a++ {\n  print(\"ok\")\n}\n", "ok\nok\n");
}

#[test]
fn exec_list_length() {
    assert_stdout("s := []int{1, 2, 3}\nprint(len(s))\n", "3\n");
}

#[test]
fn exec_panic_stops_with_status() {
    let src = "a := 1\nif a == 1 {\n  panic(\"panic\")\n}\nprint(\"after\")\n";
    if let Some((stdout, _, status)) = run(src) {
        assert_eq!(stdout, "panic: panic\n");
        assert_ne!(status, 0);
    }
}

#[test]
fn exec_substring() {
    assert_stdout("a := \"test\"\nprint(a[1:3])\nprint(a[3])\nprint(len(a))\n", "es\nt\n4\n");
}

#[test]
fn exec_arithmetic_precedence_and_negation() {
    assert_stdout("print(2 + 3 * 4)\nprint((2 + 3) * 4)\nprint(-5 + 2)\nprint(17 % 5)\n", "14\n20\n-3\n2\n");
}

#[test]
fn exec_compound_assignment() {
    assert_stdout("x := 10\nx += 5\nx -= 1\nx *= 2\nx--\nprint(x)\n", "27\n");
}

#[test]
fn exec_string_concat_and_compare() {
    let src = "a := \"foo\"\nb := a + \"bar\"\nprint(b)\nprint(b == \"foobar\")\nprint(a != \"foo\")\n";
    assert_stdout(src, "foobar\n1\n0\n");
}

#[test]
fn exec_special_characters_survive() {
    assert_stdout("print(\"say \\\"$HOME\\\" `id` \\\\ 100%\")\n", "say \"$HOME\" `id` \\ 100%\n");
}

#[test]
fn exec_list_growth_fills_defaults() {
    let src = "l := []int{}\nl[2] = 5\nprint(len(l))\nprint(l[0])\nprint(l[2])\n";
    assert_stdout(src, "3\n0\n5\n");
}

#[test]
fn exec_list_assignment_copies() {
    let src = "a := []int{1}\nb := a\nb[0] = 2\nprint(a[0])\nprint(b[0])\n";
    assert_stdout(src, "1\n2\n");
}

#[test]
fn exec_range_over_list_and_string() {
    let src = "s := []string{\"a\", \"b\"}\nfor i, v := range s {\n  print(itoa(i) + v)\n}\nfor _, c := range \"hey\" {\n  print(c)\n}\n";
    assert_stdout(src, "0a\n1b\nh\ne\ny\n");
}

#[test]
fn exec_break_and_continue() {
    let src = "\
for i := 0; i < 10; i++ {
  if i == 5 {
    break
  }
  if i % 2 == 0 {
    continue
  }
  print(i)
}
";
    assert_stdout(src, "1\n3\n");
}

#[test]
fn exec_if_else_chain() {
    let src = "\
x := 7
if x < 5 {
  print(\"small\")
} else if x < 10 {
  print(\"medium\")
} else {
  print(\"large\")
}
";
    assert_stdout(src, "medium\n");
}

#[test]
fn exec_switch_with_default() {
    let src = "\
for x := 1; x <= 4; x++ {
  switch x {
  case 1:
    print(\"one\")
  case 2, 3:
    print(\"few\")
  default:
    print(\"many\")
  }
}
";
    assert_stdout(src, "one\nfew\nfew\nmany\n");
}

#[test]
fn exec_recursive_function() {
    let src = "\
func fib(n int) int {
  if n < 2 {
    return n
  }
  return fib(n - 1) + fib(n - 2)
}
print(fib(10))
";
    assert_stdout(src, "55\n");
}

#[test]
fn exec_multiple_returns() {
    let src = "\
func divmod(a int, b int) (int, int) {
  return a / b, a % b
}
q, r := divmod(17, 5)
print(q)
print(r)
";
    assert_stdout(src, "3\n2\n");
}

#[test]
fn exec_list_parameter_and_return() {
    let src = "\
func sum(l []int) int {
  t := 0
  for _, v := range l {
    t += v
  }
  return t
}
func twice(l []int) []int {
  out := []int{}
  for i, v := range l {
    out[i] = v * 2
  }
  return out
}
d := twice([]int{1, 2, 3})
print(sum(d))
print(len(d))
";
    assert_stdout(src, "12\n3\n");
}

#[test]
fn exec_function_updates_global() {
    let src = "\
count := 0
func bump(by int) {
  step := by
  count += step
}
bump(2)
bump(3)
print(count)
";
    assert_stdout(src, "5\n");
}

#[test]
fn exec_itoa_atoi_round_trip() {
    assert_stdout("print(atoi(\"41\") + 1)\nprint(itoa(7) + \"!\")\n", "42\n7!\n");
}

#[test]
fn exec_file_builtins() {
    let src = "\
write(\"f.txt\", \"a\")
write(\"f.txt\", \"b\", true)
print(read(\"f.txt\"))
print(exists(\"f.txt\"))
print(exists(\"missing.txt\"))
";
    assert_stdout(src, "a\nb\n1\n0\n");
}

#[test]
fn exec_input_reads_a_line() {
    let src = "name := input(\"name? \")\nprint(\"hi \" + name)\n";
    if let Some((stdout, stderr, status)) = run_with_stdin(src, "world\n") {
        assert_eq!(status, 0, "{}", stderr);
        assert_eq!(stdout, "name? hi world\n");
    }
}

#[test]
fn exec_process_capture() {
    assert_stdout("out := @echo{\"hi\"}\nprint(out)\n", "hi\n");
}

#[test]
fn exec_process_pipeline() {
    assert_stdout("out := @printf{\"a\\nb\\n\"} | @grep{\"b\"}\nprint(out)\n", "b\n");
}

#[test]
fn exec_process_capture_with_stderr_and_status() {
    let src = "o, e, c := @sh{\"-c\", \"echo out; echo err 1>&2; exit 3\"}\nprint(o)\nprint(e)\nprint(c)\n";
    assert_stdout(src, "out\nerr\n3\n");
}

#[test]
fn exec_process_statement_passes_output_through() {
    assert_stdout("@echo{\"direct\"}\nprint(\"done\")\n", "direct\ndone\n");
}
